// backtrack-regex - a backtracking, PCRE-flavored regular expression engine.
//
// Module layout mirrors the matching pipeline: a pattern's source
// bytes flow through `parser` (syntax -> token tree), `factory`
// (token tree -> match graph), and `core_matcher` (match graph -> byte
// offsets), with `codec`/`class`/`capture` as the shared value types
// and `engine` holding the compiled-pattern cache behind the public
// `api`.

pub mod api;
pub mod atom;
pub mod capture;
pub mod class;
pub mod codec;
pub mod core_matcher;
pub mod engine;
pub mod error;
pub mod factory;
pub mod parser;
pub mod prelude;
pub mod token;

pub use api::{
    CaptureNames, Captures, CapturesIter, FindIter, Match, Regex, RegexBuilder, Scanner,
};
pub use error::RegexError;
