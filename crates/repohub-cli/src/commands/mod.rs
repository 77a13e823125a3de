pub mod cat;
pub mod format;
pub mod repos;
pub mod rm;
pub mod search;
pub mod show;
pub mod tree;
pub mod upload;

use repohub::Feedback;

/// Print feedback items to stderr.
pub fn print_feedback(feedback: &[Feedback]) {
    for item in feedback {
        eprintln!("{item}");
    }
}
