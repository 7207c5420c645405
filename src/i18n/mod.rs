//! Text-level building blocks used by the engine.
//!
//! # Architecture
//!
//! - `keypath`: dot-path addressing over nested string trees
//! - `plural`: locale-family plural form selection
//! - `interpolate`: placeholder substitution
//! - `validator`: structural checks on translated values
//!
//! # Example
//!
//! ```rust
//! use translation_store::i18n::{pluralize, Interpolator, Node};
//!
//! let mut tree = Node::branch();
//! tree.write("cart.items", "{{count}} item|{{count}} items");
//!
//! let value = tree.read("cart.items").unwrap();
//! let form = pluralize(value, "|", 3, "en");
//!
//! let interpolator = Interpolator::new("{{", "}}").unwrap();
//! let vars = [("count".to_string(), serde_json::json!(3))].into_iter().collect();
//! assert_eq!(interpolator.interpolate(&form, &vars), "3 items");
//! ```

pub mod interpolate;
pub mod keypath;
pub mod plural;
mod validator;

pub use interpolate::{Interpolator, Vars};
pub use keypath::Node;
pub use plural::{pluralize, PluralFamily};
pub use validator::{TranslationValidator, ValidationReport};
