use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::table;

pub use ad::*;
pub use id::*;
pub use timestamp::*;
pub use view::*;

mod ad;
mod id;
mod timestamp;
mod view;
