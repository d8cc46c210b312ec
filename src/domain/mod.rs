//! Domain layer: commands, the bounded queue, the admission gate and the
//! subscriber registry.
//!
//! Everything here is transport-agnostic; the service layer wires these
//! pieces together and the HTTP layer exposes them.

pub mod command;
pub mod command_queue;
pub mod subscriber;
pub mod subscriber_registry;
pub mod validator;

pub use command::Command;
pub use command_queue::CommandQueue;
pub use subscriber::{CommandSink, Subscriber, SubscriberId};
pub use subscriber_registry::{ReadySubscribers, SubscriberRegistry};
pub use validator::{CommandValidator, RandomSource, SeededRandom, ThreadRandom};
