use super::*;

#[test]
fn invalid_arguments_maps_to_exit_code_two() {
    let err = CliError::InvalidArguments("need --plan".to_string());
    assert_eq!(err.exit_code(), EXIT_INVALID_ARGUMENTS);
}

#[test]
fn plan_not_found_maps_to_exit_code_four() {
    let err = CliError::PlanNotFound("missing.md".to_string());
    assert_eq!(err.exit_code(), EXIT_PLAN_NOT_FOUND);
}

#[test]
fn already_running_maps_to_exit_code_three() {
    let err = CliError::AlreadyRunning { existing_pid: 1234 };
    assert_eq!(err.exit_code(), EXIT_ALREADY_RUNNING);
}

#[test]
fn unhandled_errors_map_to_exit_code_one() {
    let err = CliError::Internal("boom".to_string());
    assert_eq!(err.exit_code(), EXIT_INTERNAL_ERROR);
}
