use super::*;

#[test]
fn empty_string_setting_is_treated_as_absent() {
    let settings = Settings::new().with(PYTHON_INTERPRETER_PATH, "");
    assert_eq!(settings.get(PYTHON_INTERPRETER_PATH), None);
}

#[test]
fn explicit_setting_wins_over_path_lookup() {
    let settings = Settings::new().with(CONDA_PATH, "/opt/conda/bin/conda");
    assert_eq!(settings.conda_path().as_deref(), Some("/opt/conda/bin/conda"));
}

#[test]
fn julia_project_path_is_passthrough() {
    let settings = Settings::new().with(JULIA_PROJECT_PATH, "/work/Project.toml");
    assert_eq!(settings.julia_project_path(), Some("/work/Project.toml"));
}
