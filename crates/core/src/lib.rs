pub mod activity;
pub mod box_type;
pub mod error;
pub mod grant;
pub mod invocation;
pub mod listener;
pub mod notification;
pub mod types;
pub mod uri;

pub use activity::{Activity, Actor};
pub use box_type::BoxType;
pub use error::PodwatchError;
pub use grant::{AccessGrant, AppAccessGrant, RawGrant, SpecialRight};
pub use invocation::HandlerInvocation;
pub use listener::ListenerJob;
pub use notification::NotificationEvent;
pub use types::{ActionName, ActorUri};
pub use uri::container_of;
