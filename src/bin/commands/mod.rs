pub mod check_cmd;
pub mod evaluate_cmd;
pub mod extract_cmd;
pub mod inspect_cmd;

pub use check_cmd::cmd_check;
pub use evaluate_cmd::cmd_evaluate;
pub use extract_cmd::cmd_extract;
pub use inspect_cmd::cmd_inspect;
