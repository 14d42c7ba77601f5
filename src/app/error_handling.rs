//! Error handling utilities

use tracing::error;

/// Handle fatal errors and exit with appropriate status code
///
/// - For `FeatureError`: shows the user message always, the developer message
///   with its source chain in verbose mode, and exits with the error's code
/// - For other errors: shows the error (and its chain in verbose mode) and
///   exits with 1
pub fn handle_fatal_error(error: anyhow::Error, verbose: u8) -> ! {
    use crate::error::FeatureError;

    error!("Fatal error: {:#}", error);

    let exit_code = if let Some(feature_err) = error.downcast_ref::<FeatureError>() {
        eprintln!("{}", feature_err.user_message());
        if error.to_string() != feature_err.to_string() {
            eprintln!("  while: {}", error);
        }

        if verbose >= 1 {
            eprintln!("\nContext Chain:\n{}", feature_err.developer_message());
        }

        feature_err.exit_code()
    } else {
        eprintln!("Error: {error}");

        if verbose >= 1 {
            eprintln!("\nError chain:");
            for (i, cause) in error.chain().enumerate() {
                eprintln!("  {}: {}", i, cause);
            }
        }

        1
    };

    std::process::exit(exit_code)
}
