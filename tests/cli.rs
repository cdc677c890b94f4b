use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::fs;

fn s1_ast() -> Value {
    json!({
        "package": "p",
        "decls": [
            { "decl": "gen", "specs": [ { "spec": "import", "path": "\"x/y/z\"" } ] },
            { "decl": "gen", "specs": [ { "spec": "import", "path": "\"u/v\"" } ] },
            { "decl": "gen", "specs": [
                { "spec": "type", "name": "A", "type": { "expr": "struct", "fields": [
                    { "names": ["F"], "type": { "expr": "selector", "x": { "expr": "ident", "name": "z" }, "sel": "T" },
                      "tag": "`json:\"f,omitempty\"`" }
                ] } },
                { "spec": "type", "name": "B", "type": { "expr": "ident", "name": "int" } }
            ] }
        ]
    })
}

fn stdout_json(output: std::process::Output) -> anyhow::Result<Value> {
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    Ok(serde_json::from_slice(&output.stdout)?)
}

#[test]
fn lift_file_prints_typed_ir() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("a.json");
    fs::write(&input, s1_ast().to_string())?;

    let output = Command::cargo_bin("typelift")?.arg("lift").arg("-i").arg(&input).output()?;
    let lifted = stdout_json(output)?;

    assert_eq!(lifted["package"], "p");
    assert_eq!(lifted["imports"], json!({ "z": { "path": "x/y/z" } }));
    assert_eq!(lifted.pointer("/code/0/kind"), Some(&json!("struct")));
    assert_eq!(lifted.pointer("/code/0/fields/0/type/type"), Some(&json!("z.T")));
    assert_eq!(lifted.pointer("/code/0/fields/0/tags/json"), Some(&json!(["f", "omitempty"])));
    assert_eq!(lifted.pointer("/code/1/name"), Some(&json!("B")));
    Ok(())
}

#[test]
fn lift_stdin_with_pipeline() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let pipeline = dir.path().join("pipeline.json");
    fs::write(
        &pipeline,
        json!({
            "package": "model",
            "transforms": [ { "kind": "exclude_type", "matching": { "names": ["B"] } } ]
        })
        .to_string(),
    )?;

    let output = Command::cargo_bin("typelift")?
        .args(["lift", "-i", "-", "--transforms"])
        .arg(&pipeline)
        .write_stdin(s1_ast().to_string())
        .output()?;
    let lifted = stdout_json(output)?;
    assert_eq!(lifted["package"], "model");
    assert_eq!(lifted["code"].as_array().map(Vec::len), Some(1));

    let output = Command::cargo_bin("typelift")?
        .args(["lift", "-i", "-", "--package", "flagged", "--transforms"])
        .arg(&pipeline)
        .write_stdin(s1_ast().to_string())
        .output()?;
    assert_eq!(stdout_json(output)?["package"], "flagged");
    Ok(())
}

#[test]
fn json_pointer_and_jq_select_documents() -> anyhow::Result<()> {
    let wrapped = json!({ "result": { "files": [ s1_ast(), s1_ast() ] } });

    let output = Command::cargo_bin("typelift")?
        .args(["lift", "-i", "-", "--json-pointer", "/result/files/1"])
        .write_stdin(wrapped.to_string())
        .output()?;
    assert_eq!(stdout_json(output)?["package"], "p");

    let output = Command::cargo_bin("typelift")?
        .args(["lift", "-i", "-", "--jq-expr", ".result.files[]"])
        .write_stdin(wrapped.to_string())
        .output()?;
    let lifted = stdout_json(output)?;
    assert_eq!(lifted.as_array().map(Vec::len), Some(2));
    Ok(())
}

#[test]
fn lift_writes_out_file() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("a.json");
    let out = dir.path().join("nested").join("out.json");
    fs::write(&input, s1_ast().to_string())?;

    Command::cargo_bin("typelift")?
        .arg("lift")
        .arg("-i")
        .arg(&input)
        .arg("--out")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let lifted: Value = serde_json::from_str(&fs::read_to_string(&out)?)?;
    assert_eq!(lifted["package"], "p");
    Ok(())
}

#[test]
fn outline_lists_types() -> anyhow::Result<()> {
    Command::cargo_bin("typelift")?
        .args(["--no-color", "outline", "-i", "-"])
        .write_stdin(s1_ast().to_string())
        .assert()
        .success()
        .stdout(predicate::str::contains("package p"))
        .stdout(predicate::str::contains("type A struct"))
        .stdout(predicate::str::contains("F z.T json:\"f,omitempty\""))
        .stdout(predicate::str::contains("u/v").not());
    Ok(())
}

#[test]
fn missing_input_fails() -> anyhow::Result<()> {
    Command::cargo_bin("typelift")?
        .args(["lift", "-i", "does/not/exist.json"])
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("failed to read does/not/exist.json"));
    Ok(())
}

#[test]
fn malformed_syntax_tree_names_the_path() -> anyhow::Result<()> {
    Command::cargo_bin("typelift")?
        .args(["lift", "-i", "-"])
        .write_stdin(r#"{ "package": "p", "decls": [ { "decl": "gen", "specs": [ { "spec": "type" } ] } ] }"#)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid syntax tree"))
        .stderr(predicate::str::contains("decls[0]"));
    Ok(())
}
