use super::Completion;
use crate::capability::ClosingHook;
use crate::command::Command;
use crate::error::{Error, Result};
use crate::object_space::Handle;
use crate::runtime::Runtime;
use crate::value::{Map, Value};

/// `createHandle`: allocates a page under `page$<id>` and answers `{pageId}`.
///
/// The page's own closing signal removes the key again.
pub(super) fn create_handle(rt: &mut Runtime, command: &mut Command) -> Result<Completion> {
	let id = command
		.id_string()
		.ok_or_else(|| Error::invalid_params(&command.name, "an id is required to derive the handle key"))?;
	let key = rt.config().page_key(&id);

	let page = rt.factory().create_page(&key, rt.host().clone())?;
	page.on_closing(ClosingHook::new(&key, rt.host().clone()));

	if rt.space_mut().set(key.clone(), Handle::Capability(page)).is_some() {
		rt.drop_listeners(&key);
	}
	tracing::info!(target: "bridge.space", key = %key, "created handle");

	let mut response = Map::new();
	// Echo the id as sent; only the key uses its string form.
	let page_id = command.id.clone().map(Value::from).unwrap_or_default();
	response.insert("pageId".to_string(), page_id);
	command.response = Some(Value::Object(response));
	Ok(Completion::Now)
}
