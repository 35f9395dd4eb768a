mod spec;
mod status;
mod k8;
mod validate;

pub use self::spec::*;
pub use self::status::*;
pub use self::k8::CLUSTER_API;
pub use self::validate::*;
