//! Process exit codes. Part of the container contract.

use lesion_eval_core::errors::{EXIT_EVALUATION_FAILED, EXIT_INVALID_SUBMISSION};
use lesion_eval_core::EvalError;

pub const SUCCESS: i32 = 0;
pub const EVALUATION_FAILED: i32 = EXIT_EVALUATION_FAILED; // scoring, volume I/O or write failure
pub const INVALID_SUBMISSION: i32 = EXIT_INVALID_SUBMISSION; // manifest, slugs, likelihoods, config

pub fn from_error(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<EvalError>()
        .map_or(EVALUATION_FAILED, EvalError::exit_code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_eval_errors_through_context() {
        let err = anyhow::Error::new(EvalError::manifest("expected a list of jobs, found a number"))
            .context("reading /input/predictions.json");
        assert_eq!(from_error(&err), INVALID_SUBMISSION);

        let err = anyhow::Error::new(EvalError::volume("gt.nii.gz", "missing"));
        assert_eq!(from_error(&err), EVALUATION_FAILED);
    }

    #[test]
    fn config_errors_and_untyped_errors() {
        let err = anyhow::Error::new(EvalError::config("--min-overlap must be in [0, 1)"));
        assert_eq!(from_error(&err), INVALID_SUBMISSION);

        assert_eq!(
            from_error(&anyhow::anyhow!("invalid configuration: looks like a config error")),
            EVALUATION_FAILED
        );
    }
}
