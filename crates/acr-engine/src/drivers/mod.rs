//! Concrete `Backend` implementations: one per subprocess calling
//! convention this workspace knows how to drive.

mod common;
mod exec_driver;
mod prompts;
mod single_shot_driver;
mod stdin_driver;

pub use exec_driver::ExecDriver;
pub use prompts::{render_review_prompt, render_summary_stdin, DiffEmbed, FP_FILTER_PROMPT, GROUPING_PROMPT};
pub use single_shot_driver::SingleShotDriver;
pub use stdin_driver::StdinDriver;
