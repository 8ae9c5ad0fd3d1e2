//! Command table and generated dispatch glue.

mod events;
mod handle;
mod invoke;
mod property;


use crate::command::Command;
use crate::error::{Error, Result};
use crate::runtime::Runtime;

/// How a handler finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
	/// The response is set; the loop writes it now.
	Now,
	/// A continuation will complete the command later.
	Deferred,
}

/// Handler signature shared by every built-in command.
pub type Handler = fn(&mut Runtime, &mut Command) -> Result<Completion>;

/// Generates `CommandId`, `lookup_command`, `command_name`, and `handler_for`.
///
/// The first name of each entry is the primary one; the rest are aliases.
macro_rules! command_table {
	(
		$(
			$id:ident => $handler:path {
				names: [ $primary:literal $(, $alias:literal)* $(,)? ]
			}
		),+ $(,)?
	) => {
		#[derive(Debug, Clone, Copy, PartialEq, Eq)]
		pub enum CommandId { $($id),+ }

		/// Resolves a wire name (primary or alias).
		pub fn lookup_command(name: &str) -> Option<CommandId> {
			match name {
				$(
					$primary $(| $alias)* => Some(CommandId::$id),
				)+
				_ => None,
			}
		}

		pub fn command_name(id: CommandId) -> &'static str {
			match id {
				$(CommandId::$id => $primary,)+
			}
		}

		fn handler_for(id: CommandId) -> Handler {
			match id {
				$(CommandId::$id => $handler,)+
			}
		}
	};
}

command_table! {
	CreateHandle => handle::create_handle { names: ["createHandle", "createPage"] },
	Property => property::property { names: ["property"] },
	Setting => property::setting { names: ["setting"] },
	WindowProperty => property::window_property { names: ["windowProperty"] },
	DefineMethod => property::define_method { names: ["defineMethod"] },
	AddEvent => events::add_event { names: ["addEvent"] },
	RemoveEvent => events::remove_event { names: ["removeEvent"] },
	InvokeMethod => invoke::invoke_method { names: ["invokeMethod"] },
	InvokeAsyncMethod => invoke::invoke_async_method { names: ["invokeAsyncMethod"] },
	Noop => invoke::noop { names: ["noop"] },
}

/// Runs the handler named by `command`.
pub fn dispatch(rt: &mut Runtime, command: &mut Command) -> Result<Completion> {
	let Some(id) = lookup_command(&command.name) else {
		return Err(Error::UnknownCommand(command.name.clone()));
	};
	tracing::trace!(
		target: "bridge.dispatch",
		command = command_name(id),
		key = ?command.target,
		params = command.params.len(),
		"dispatching"
	);
	handler_for(id)(rt, command)
}
