//! # Reinhardt CRUD
//!
//! A generic admin CRUD controller. Concrete controllers declare a primary
//! object (singular and plural nouns, view directory, optional slug and index
//! route) and inherit list rendering, add/edit forms, safe deletion and
//! opt-in validation.
//!
//! ## Building blocks
//!
//! - [`identity`] - module slug and naming resolution
//! - [`cast`] - field-wise copy between object types
//! - [`redirect`] - list view URI resolution and redirects
//! - [`delete`] - identifier sanitation and idempotent deletion
//! - [`validation`] - per-action rule checking
//! - [`view`] - view data and rendering
//! - [`controller`] - the per-request controller tying the above together
//!
//! Collaborators live behind traits: [`DataAccess`](data::DataAccess),
//! [`RouteTable`](routes::RouteTable), [`FlashStore`](flash::FlashStore),
//! [`ViewRenderer`](view::ViewRenderer) and [`Validator`](validation::Validator).
//! In-memory implementations are provided for each.
//!
//! ## Feature Flags
//!
//! - `templates` (default) - [`TeraRenderer`](view::TeraRenderer), a Tera-backed renderer
//!
//! ## Quick Example
//!
//! ```rust
//! use reinhardt_crud::prelude::*;
//!
//! struct Countries;
//!
//! impl CrudController for Countries {
//!     const CONFIG: ControllerConfig =
//!         ControllerConfig::new("CountriesController", "Country", "countries");
//! }
//!
//! let identity = ControllerIdentity::resolve(&Countries::CONFIG).unwrap();
//! assert_eq!(identity.module_slug, "countries");
//! assert_eq!(identity.list_key(), "countryList");
//! ```

pub mod cast;
pub mod context;
pub mod controller;
pub mod data;
pub mod delete;
pub mod error;
pub mod flash;
pub mod identity;
pub mod naming;
pub mod redirect;
pub mod routes;
pub mod settings;
pub mod validation;
pub mod view;

pub use controller::{BaseController, CrudController, CrudServices, DeleteOutcome};
pub use error::{CrudError, CrudResult};

/// Prelude module for convenient imports
pub mod prelude {
	pub use crate::cast::{CastFrom, cast, cast_dynamic, cast_into};
	pub use crate::context::{QueryLog, RequestContext};
	pub use crate::controller::{BaseController, CrudController, CrudServices, DeleteOutcome};
	pub use crate::data::{
		DataAccess, DbError, Executed, Identifier, MemoryStore, MutationReport, Record,
	};
	pub use crate::delete::{DeleteResult, RawIdentifier};
	pub use crate::error::{CrudError, CrudResult};
	pub use crate::flash::{Flash, FlashKey, FlashStore, MemoryFlashStore};
	pub use crate::identity::{ControllerConfig, ControllerIdentity};
	pub use crate::redirect::Redirect;
	pub use crate::routes::{RouteRegistry, RouteTable};
	pub use crate::settings::CrudSettings;
	pub use crate::validation::{RuleSet, RuleValidator, ValidationErrors, Validator};
	pub use crate::view::{ViewData, ViewRenderer};

	#[cfg(feature = "templates")]
	pub use crate::view::TeraRenderer;

	pub use crate::impl_cast;
}
