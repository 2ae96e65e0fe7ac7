//! Generic CRUD controller
//!
//! A concrete controller is a zero-sized type implementing [`CrudController`].
//! Per request, a [`BaseController`] is built for it: the identity is resolved
//! from the static declaration, view data is seeded, and the list, form and
//! delete actions run against the shared [`CrudServices`].
//!
//! ```rust,no_run
//! use reinhardt_crud::prelude::*;
//! use std::sync::Arc;
//!
//! struct Countries;
//!
//! impl CrudController for Countries {
//!     const CONFIG: ControllerConfig =
//!         ControllerConfig::new("Countries", "Country", "countries").with_view_path("geo/");
//! }
//!
//! # async fn handle(services: CrudServices, flash: Arc<MemoryFlashStore>) -> CrudResult<()> {
//! let mut controller = BaseController::<Countries>::new(&services, RequestContext::new(flash))?;
//! let outcome = controller.delete("7", true).await;
//! let _response = outcome.redirect.into_response()?;
//! # Ok(())
//! # }
//! ```

use crate::context::RequestContext;
use crate::data::{DataAccess, Record};
use crate::delete::{
	DeleteResult, RawIdentifier, delete_record, deletion_flash, sanitize_identifier,
};
use crate::error::CrudResult;
use crate::flash::{Flash, FlashKey};
use crate::identity::{ControllerConfig, ControllerIdentity};
use crate::naming::capfirst;
use crate::redirect::{Redirect, base_url, resolve_list_view_uri};
use crate::routes::RouteTable;
use crate::settings::CrudSettings;
use crate::validation::{RuleSet, RuleValidator, ValidationErrors, Validator, can_validate};
use crate::view::{ViewData, ViewRenderer, check_required_keys, html_response};
use bytes::Bytes;
use http::Response;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;

/// Static declaration implemented by every concrete controller
pub trait CrudController: Send + Sync + 'static {
	/// Primary object, naming and routing declaration
	const CONFIG: ControllerConfig;

	/// Validation rules of an action; `None` means the action is not validated
	fn validation_rules(_action: &str) -> Option<RuleSet> {
		None
	}

	/// Controller-specific view data defaults, applied before the base defaults
	fn view_defaults(_view_data: &mut ViewData) {}
}

/// Collaborators shared across requests
#[derive(Clone)]
pub struct CrudServices {
	/// Application settings
	pub settings: Arc<CrudSettings>,
	/// Data access bound to the primary object
	pub data: Arc<dyn DataAccess>,
	/// Route metadata
	pub routes: Arc<dyn RouteTable>,
	/// Template renderer
	pub renderer: Arc<dyn ViewRenderer>,
	/// Validation rule engine
	pub validator: Arc<dyn Validator>,
}

impl CrudServices {
	/// Bundle collaborators, using [`RuleValidator`] for validation
	pub fn new(
		settings: CrudSettings,
		data: Arc<dyn DataAccess>,
		routes: Arc<dyn RouteTable>,
		renderer: Arc<dyn ViewRenderer>,
	) -> Self {
		Self {
			settings: Arc::new(settings),
			data,
			routes,
			renderer,
			validator: Arc::new(RuleValidator::new()),
		}
	}

	/// Replace the validation rule engine
	pub fn with_validator(mut self, validator: Arc<dyn Validator>) -> Self {
		self.validator = validator;
		self
	}
}

/// Result of a delete action: the structured result and the single redirect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteOutcome {
	/// What the data-access layer reported
	pub result: DeleteResult,
	/// Redirect back to the list view, carrying the flash message
	pub redirect: Redirect,
}

/// Per-request controller state for a concrete controller `C`
pub struct BaseController<C: CrudController> {
	identity: ControllerIdentity,
	services: CrudServices,
	context: RequestContext,
	view_data: ViewData,
	current_view: Option<String>,
	current_action: String,
	validation_errors: ValidationErrors,
	_controller: PhantomData<C>,
}

impl<C: CrudController> BaseController<C> {
	/// Initialize a controller for one request
	///
	/// Resolves the identity and seeds `pageTitle`, `pageSubTitle`,
	/// `errorMessage`, `successMessage`, `currentModule` and `viewPath`. Flash
	/// messages are consumed from the session here.
	///
	/// # Errors
	///
	/// Returns [`CrudError::Configuration`](crate::error::CrudError::Configuration)
	/// if the declaration cannot produce a module slug.
	pub fn new(services: &CrudServices, context: RequestContext) -> CrudResult<Self> {
		Self::with_view_data(services, context, ViewData::new())
	}

	/// Initialize with caller-supplied view data, which takes priority over defaults
	pub fn with_view_data(
		services: &CrudServices,
		context: RequestContext,
		mut view_data: ViewData,
	) -> CrudResult<Self> {
		let identity = ControllerIdentity::resolve(&C::CONFIG)?;

		C::view_defaults(&mut view_data);

		if !identity.plural_name.is_empty() {
			view_data.set_if_blank("pageTitle", capfirst(&identity.plural_name));
		}
		view_data.set_if_absent("pageTitle", Value::Null);

		let settings = &services.settings;
		if settings.use_page_sub_title && !settings.app_name.is_empty() {
			view_data.set_if_absent("pageSubTitle", format!(" in {}", settings.app_name));
		}

		for key in [FlashKey::ErrorMessage, FlashKey::SuccessMessage] {
			let message = context.flash().take_flash(key);
			view_data.set_if_absent(key.as_str(), message.map_or(Value::Null, Value::String));
		}

		view_data.set_if_absent("currentModule", identity.module_slug.clone());
		view_data.set_if_absent("viewPath", identity.view_path.clone());

		Ok(Self {
			identity,
			services: services.clone(),
			context,
			view_data,
			current_view: None,
			current_action: String::new(),
			validation_errors: ValidationErrors::new(),
			_controller: PhantomData,
		})
	}

	/// Resolved identity
	pub fn identity(&self) -> &ControllerIdentity {
		&self.identity
	}

	/// View data accumulated so far
	pub fn view_data(&self) -> &ViewData {
		&self.view_data
	}

	/// Mutable view data, for action-specific values
	pub fn view_data_mut(&mut self) -> &mut ViewData {
		&mut self.view_data
	}

	/// Request context
	pub fn context(&self) -> &RequestContext {
		&self.context
	}

	/// Use a specific view file (relative to the view path) instead of the default
	pub fn set_current_view(&mut self, view: impl Into<String>) {
		self.current_view = Some(view.into()).filter(|v: &String| !v.is_empty());
	}

	/// Name of the action being handled
	pub fn current_action(&self) -> &str {
		&self.current_action
	}

	/// Set the action whose validation rules apply
	pub fn set_current_action(&mut self, action: impl Into<String>) {
		self.current_action = action.into();
	}

	/// Failures from the last validation run
	pub fn validation_errors(&self) -> &ValidationErrors {
		&self.validation_errors
	}

	fn view_file(&self, suffix: &str) -> String {
		match &self.current_view {
			Some(view) => format!("{}{}", self.identity.view_path, view),
			None => format!(
				"{}view{}{}",
				self.identity.view_path,
				capfirst(&self.identity.singular_name_cc),
				suffix
			),
		}
	}

	/// View file of the list action, e.g. `geo/viewCountryList`
	pub fn list_view_path(&self) -> String {
		self.view_file("List")
	}

	/// View file of the form action, e.g. `geo/viewCountryForm`
	pub fn form_view_path(&self) -> String {
		self.view_file("Form")
	}

	/// Fetch every record of the primary object as typed objects
	pub async fn fetch_all_as<T: DeserializeOwned>(&mut self) -> CrudResult<Vec<T>> {
		let records = self.fetch_all().await?;
		records
			.into_iter()
			.map(|record| serde_json::from_value(Value::Object(record)).map_err(Into::into))
			.collect()
	}

	async fn fetch_all(&mut self) -> CrudResult<Vec<Record>> {
		match self.services.data.find_all().await {
			Ok(executed) => {
				self.context.queries_mut().collect(executed.query);
				Ok(executed.value)
			}
			Err(e) => {
				if let Some(query) = e.query() {
					self.context.queries_mut().collect(query);
				}
				Err(e)
			}
		}
	}

	/// Prepare list view data and return the view file to render
	///
	/// Records are only fetched when the list key is not already set.
	///
	/// # Errors
	///
	/// Data-access failures are returned, not swallowed.
	pub async fn prepare_list(&mut self) -> CrudResult<String> {
		self.current_action = "index".to_string();

		if !self.identity.plural_name.is_empty() {
			self.view_data
				.set_if_blank("boxTitle", capfirst(&self.identity.plural_name));
		}

		let list_key = self.identity.list_key();
		if !self.view_data.contains_key(&list_key) {
			let records = self.fetch_all().await?;
			self.view_data.insert(
				list_key,
				Value::Array(records.into_iter().map(Value::Object).collect()),
			);
		}

		Ok(self.list_view_path())
	}

	/// Render the list view
	pub async fn render_list(&mut self) -> CrudResult<Response<Bytes>> {
		let view_path = self.prepare_list().await?;
		self.render(&view_path)
	}

	/// Prepare form view data and return the view file to render
	///
	/// `action` may carry a `Type::` prefix, which is stripped.
	pub fn prepare_form(&mut self, action: &str, object_id: Option<&str>) -> String {
		let action = action.rsplit("::").next().unwrap_or(action).to_string();
		let object_id = object_id.map(str::trim).filter(|id| !id.is_empty());
		self.current_action = action.clone();

		let mut defaults = ViewData::new();
		defaults.insert("usingSelect2", true);
		defaults.insert("action", action.clone());

		let form_path = match object_id {
			Some(id) => format!("{}/{}/{}/", self.identity.module_slug, action, id),
			None => format!("{}/{}/", self.identity.module_slug, action),
		};
		defaults.insert(
			"formAction",
			base_url(&self.services.settings.base_url, &form_path),
		);
		self.view_data.merge_defaults(defaults);

		if !self.identity.singular_name.is_empty() {
			let article = if action == "add"
				&& !self.identity.singular_name.to_lowercase().contains("new")
			{
				" a New "
			} else {
				" "
			};
			self.view_data.set_if_blank(
				"boxTitle",
				format!(
					"{}{}{}",
					capfirst(&action),
					article,
					capfirst(&self.identity.singular_name)
				),
			);
		}

		let validation = self
			.validation_errors
			.iter()
			.map(|(field, message)| (field.to_string(), Value::from(message)))
			.collect();
		self.view_data.insert("validation", Value::Object(validation));

		self.form_view_path()
	}

	/// Render the add/edit form
	pub fn render_form(
		&mut self,
		action: &str,
		object_id: Option<&str>,
	) -> CrudResult<Response<Bytes>> {
		let view_path = self.prepare_form(action, object_id);
		self.render(&view_path)
	}

	fn render(&self, view_path: &str) -> CrudResult<Response<Bytes>> {
		check_required_keys(view_path, &self.view_data)?;
		let body = self.services.renderer.render(view_path, &self.view_data)?;
		Ok(html_response(body))
	}

	/// Run the current action's validation rules against the request payload
	///
	/// Passes when the action declares no rules. Failures are kept for the
	/// form view.
	pub fn can_validate(&mut self) -> CrudResult<bool> {
		let rules = C::validation_rules(&self.current_action);
		can_validate(
			rules.as_ref(),
			self.services.validator.as_ref(),
			self.context.payload(),
			&mut self.validation_errors,
		)
	}

	/// URI of the list view
	pub fn list_view_uri(&self) -> String {
		resolve_list_view_uri(
			&self.identity,
			self.identity.index_route_name.as_deref(),
			self.services.routes.as_ref(),
			&self.services.settings.base_url,
		)
	}

	/// Redirect to the list view, storing `flash` for the next request
	pub fn redirect_to_list(&self, flash: Option<Flash>) -> Redirect {
		let uri = self.list_view_uri();
		tracing::debug!(module = %self.identity.module_slug, %uri, "redirecting to list view");

		let redirect = Redirect::to(uri);
		match flash {
			Some((key, message)) if !message.is_empty() => {
				self.context.flash().set_flash(key, message.clone());
				redirect.with(key, message)
			}
			_ => redirect,
		}
	}

	/// Delete one record and redirect to the list view
	///
	/// Issues exactly one redirect and never renders. Bad identifiers short
	/// circuit before any data access; persistence failures are logged and
	/// reported as zero affected rows.
	pub async fn delete(
		&mut self,
		raw_id: impl Into<RawIdentifier>,
		permanent: bool,
	) -> DeleteOutcome {
		let raw_id = raw_id.into();
		let object_name = self.identity.singular_name.clone();

		let result = match sanitize_identifier(&raw_id) {
			Ok(id) => {
				let result = delete_record(
					self.services.data.as_ref(),
					&id,
					permanent,
					&self.services.settings.soft_delete_field,
					&object_name,
					self.context.queries_mut(),
				)
				.await;

				if result.affected_rows > 1 {
					tracing::warn!(
						object = %object_name,
						id = %id,
						affected_rows = result.affected_rows,
						"more than one row has been deleted in attempt to delete a single object"
					);
				}
				result
			}
			Err(e) => {
				tracing::debug!(object = %object_name, error = %e, "rejected delete identifier");
				DeleteResult::invalid_identifier()
			}
		};

		let flash = deletion_flash(&object_name, &result);
		let redirect = self.redirect_to_list(Some(flash));
		DeleteOutcome { result, redirect }
	}
}
