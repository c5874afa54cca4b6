use std::collections::HashMap;

use indoc::indoc;
use pretty_assertions::assert_eq;
use verfmt::{ConfigError, EvalError, FunctionRegistry, MissingKey, OutputSet};

const VERSION_CONFIG: &str = indoc! {r#"
    [[output]]
    name = "_Branch"
    template = "$GitInfo(ShortBranchName)"

    [[output]]
    name = "_IsMain"
    template = "$Equal(<_Branch>, main)"

    [[output]]
    name = "_Label"
    template = "$RegexReplace(<_Branch>, [^A-Za-z0-9], -)"

    [[output]]
    name = "SemVer"
    template = "<Major>.<Minor>.<Patch>$IfNot(<_IsMain>, -<_Label>.$PadLeft($Head(Height), 3, 0), <Nothing>)"

    [[output]]
    name = "AssemblyVersion"
    template = "<Major>.<Minor>.0.0"

    [[output]]
    name = "Summary"
    template = "<SemVer> on $Trim( <_Branch> )"
"#};

fn registry(branch: &str) -> FunctionRegistry {
    let mut functions = FunctionRegistry::with_builtins();
    functions.register_table(
        "GitInfo",
        [("ShortBranchName", branch), ("BranchName", "refs/heads/x")],
        MissingKey::Fail,
    );
    functions.register_table("Head", [("Height", "7")], MissingKey::Fail);
    functions
}

fn base() -> HashMap<String, String> {
    [("Major", "3"), ("Minor", "2"), ("Patch", "1"), ("Nothing", "")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn renders_feature_branch_version() {
    let outputs = OutputSet::from_toml_str(VERSION_CONFIG).unwrap();
    let result = outputs.render(&base(), &registry("feature/login")).unwrap();

    assert_eq!(
        result,
        vec![
            ("SemVer".to_string(), "3.2.1-feature-login.007".to_string()),
            ("AssemblyVersion".to_string(), "3.2.0.0".to_string()),
            ("Summary".to_string(), "3.2.1-feature-login.007 on feature/login".to_string()),
        ]
    );
}

#[test]
fn renders_main_branch_version() {
    let outputs = OutputSet::from_toml_str(VERSION_CONFIG).unwrap();
    let result = outputs.render(&base(), &registry("main")).unwrap();
    assert_eq!(result[0], ("SemVer".to_string(), "3.2.1".to_string()));
}

#[test]
fn temporaries_are_stripped() {
    let outputs = OutputSet::from_toml_str(VERSION_CONFIG).unwrap();
    assert_eq!(outputs.len(), 6);

    let result = outputs.render(&base(), &registry("main")).unwrap();
    assert!(result.iter().all(|(name, _)| !name.starts_with('_')));
    assert_eq!(result.len(), 3);
}

#[test]
fn missing_table_key_names_the_output() {
    let outputs = OutputSet::from_toml_str(indoc! {r#"
        [[output]]
        name = "Path"
        template = "$GitInfo(Path)"
    "#})
    .unwrap();

    let err = outputs.render(&base(), &registry("main")).unwrap_err();
    assert_eq!(err.name, "Path");
    assert!(matches!(err.source, EvalError::FunctionFailure { ref name, .. } if name == "GitInfo"));
}

#[test]
fn loads_from_file() {
    let path = std::env::temp_dir().join(format!("verfmt-outputs-{}.toml", std::process::id()));
    std::fs::write(&path, VERSION_CONFIG).unwrap();

    let outputs = OutputSet::from_path(&path);
    std::fs::remove_file(&path).unwrap();

    let names: Vec<String> = outputs.unwrap().names().map(str::to_string).collect();
    assert_eq!(names[3], "SemVer");
}

#[test]
fn rejects_invalid_template_in_file() {
    let err = OutputSet::from_toml_str(indoc! {r#"
        [[output]]
        name = "Broken"
        template = "$PadLeft(<Build>, 4"
    "#})
    .unwrap_err();
    assert!(err.to_string().starts_with("output \"Broken\" has an invalid template"));
    assert!(matches!(err, ConfigError::InvalidTemplate { .. }));
}
