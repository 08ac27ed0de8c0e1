pub mod conditional;
pub mod config;
pub mod exception;
pub mod locate;
pub mod param;
pub mod path;
pub mod range;
pub mod request;
pub mod response;
pub mod util;
pub mod validator;

pub use config::{Config, Dotfiles, RawOptions, SendOptions};
pub use exception::{Exception, Terminal};
pub use range::ByteRange;
pub use request::Request;
pub use response::{send, ByteStream, Headers, SendResponse};
pub use validator::Validators;
