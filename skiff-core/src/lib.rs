mod as_value;
mod cursor;
mod descriptor;
mod dialect;
mod driver;
mod error;
mod extract;
mod marshal;
mod metadata;
mod query;
mod record;
mod temporal;
mod unit;
mod util;
mod value;
mod writer;

pub use ::anyhow::Context;
pub use as_value::*;
pub use cursor::ResultCursor;
pub(crate) use cursor::*;
pub use descriptor::*;
pub use dialect::*;
pub use driver::*;
pub use error::*;
pub use extract::*;
pub use marshal::*;
pub use metadata::*;
pub use query::*;
pub use record::*;
pub use temporal::*;
pub use unit::*;
pub use util::*;
pub use value::*;
pub use writer::*;
