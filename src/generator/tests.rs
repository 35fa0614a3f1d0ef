#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;
use crate::config::{ConverterConfig, HeaderConfig};
use crate::descriptor::{
    ClassDescriptor, ClassFacts, ConnectionKind, ConstantMap, DescriptorKind, MethodDescriptor,
};
use chrono::{NaiveDate, NaiveDateTime};
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir() -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("gen_test_{}_{}", std::process::id(), nanos));
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn at(hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 9)
        .unwrap()
        .and_hms_opt(hour, 30, 0)
        .unwrap()
}

fn renderer() -> Renderer {
    Renderer::new("AbstractCrudObject", "AbstractCrudObjectFields", HeaderConfig::default())
}

fn method(name: &str, endpoint: Option<&str>, kind: ConnectionKind) -> MethodDescriptor {
    MethodDescriptor {
        name: name.to_string(),
        connection_endpoint: endpoint.map(str::to_string),
        documentation: format!("Doc for {name}"),
        connection_kind: kind,
    }
}

fn campaign() -> ClassDescriptor {
    ClassDescriptor::new(
        DescriptorKind::Object,
        "Campaign",
        "FacebookAds.Object",
        "\\FacebookAds\\Object\\Campaign",
        "/sdk/Object/Campaign.php",
    )
    .with_facts(ClassFacts::Object {
        endpoint: Some("act_123/campaigns".to_string()),
        methods: vec![method("GetAds", Some("ads"), ConnectionKind::Synchronous)],
    })
}

fn enumeration(kind: DescriptorKind, names: &[(&str, &str)]) -> ClassDescriptor {
    let mut constants = ConstantMap::new();
    for (name, value) in names {
        constants.insert(*name, *value).unwrap();
    }
    let namespace = match kind {
        DescriptorKind::FieldEnumeration => "FacebookAds.Object.Fields",
        _ => "FacebookAds.Object.Values",
    };
    ClassDescriptor::new(kind, "AdStatus", namespace, "\\FacebookAds\\Object\\AdStatus", "/sdk/AdStatus.php")
        .with_facts(ClassFacts::Enumeration { constants })
}

#[test]
fn test_render_object() {
    let text = renderer().render(&campaign(), at(10)).unwrap();
    assert!(text.contains("using System.Collections.Generic;"));
    assert!(text.contains("using FacebookAds.Interfaces;"));
    assert!(text.contains("/// <date>2024-03-09 10:30:00</date>"));
    assert!(text.contains("namespace FacebookAds.Object"));
    assert!(text.contains("public class Campaign : AbstractCrudObject"));
    assert!(text.contains(
        "public Campaign(FacebookClient client, string id, string parentId = null) : base(client, id, parentId) { }"
    ));
    assert!(text.contains("return \"act_123/campaigns\";"));
    assert!(text.contains(
        "public object GetAds(string[] fields = null, Dictionary<string, object> parameters = null)"
    ));
    assert!(text.contains("return GetManyByConnection(\"ads\", fields, parameters);"));
    assert!(text.contains("/// Doc for GetAds."));
    assert!(text.contains("\\FacebookAds\\Object\\Campaign"));
}

#[test]
fn test_render_async_method_and_skips_unbound() {
    let descriptor = ClassDescriptor::new(
        DescriptorKind::Object,
        "AdAccount",
        "FacebookAds.Object",
        "\\FacebookAds\\Object\\AdAccount",
        "/sdk/Object/AdAccount.php",
    )
    .with_facts(ClassFacts::Object {
        endpoint: Some(String::new()),
        methods: vec![
            method("GetAds", Some("ads"), ConnectionKind::Synchronous),
            method("GetUsers", None, ConnectionKind::Synchronous),
            method("GetInsights", Some("insights"), ConnectionKind::Asynchronous),
        ],
    });
    let text = renderer().render(&descriptor, at(10)).unwrap();
    assert_eq!(text.matches("public object ").count(), 2);
    assert!(!text.contains("GetUsers"));
    assert!(text.contains("return GetManyByConnectionAsync(\"insights\", fields, parameters);"));
    assert!(text.contains("return \"\";"));
    assert!(text.find("GetAds").unwrap() < text.find("GetInsights").unwrap());
}

#[test]
fn test_render_enumeration_keeps_order() {
    let descriptor = enumeration(
        DescriptorKind::FieldEnumeration,
        &[("C", "c"), ("A", "a"), ("B", "b")],
    );
    let text = renderer().render(&descriptor, at(10)).unwrap();
    assert!(text.contains("namespace FacebookAds.Object.Fields"));
    assert!(text.contains("public class AdStatus : AbstractCrudObjectFields"));
    let c = text.find("public const string C = \"c\";").unwrap();
    let a = text.find("public const string A = \"a\";").unwrap();
    let b = text.find("public const string B = \"b\";").unwrap();
    assert!(c < a && a < b);
}

#[test]
fn test_value_enumeration_uses_value_namespace() {
    let descriptor = enumeration(DescriptorKind::ValueEnumeration, &[("ACTIVE", "ACTIVE")]);
    let text = renderer().render(&descriptor, at(10)).unwrap();
    assert!(text.contains("namespace FacebookAds.Object.Values"));
}

#[test]
fn test_render_is_idempotent_except_for_date_line() {
    let first = renderer().render(&campaign(), at(10)).unwrap();
    let second = renderer().render(&campaign(), at(11)).unwrap();
    assert_ne!(first, second);

    let first_lines: Vec<_> = first.lines().collect();
    let second_lines: Vec<_> = second.lines().collect();
    assert_eq!(first_lines.len(), second_lines.len());
    let differing: Vec<_> = first_lines
        .iter()
        .zip(&second_lines)
        .filter(|(a, b)| a != b)
        .collect();
    assert_eq!(differing.len(), 1);
    assert!(differing[0].0.starts_with("/// <date>"));

    assert_eq!(first, renderer().render(&campaign(), at(10)).unwrap());
}

#[test]
fn test_string_literals_are_escaped() {
    let descriptor = enumeration(
        DescriptorKind::ValueEnumeration,
        &[("QUOTE", "say \"hi\""), ("PATH", "a\\b"), ("LINE", "x\ny")],
    );
    let text = renderer().render(&descriptor, at(10)).unwrap();
    assert!(text.contains(r#"public const string QUOTE = "say \"hi\"";"#));
    assert!(text.contains(r#"public const string PATH = "a\\b";"#));
    assert!(text.contains(r#"public const string LINE = "x\ny";"#));
}

#[test]
fn test_render_errors() {
    let unreflected = ClassDescriptor::new(
        DescriptorKind::Object,
        "Campaign",
        "FacebookAds.Object",
        "\\FacebookAds\\Object\\Campaign",
        "/sdk/Campaign.php",
    );
    let err = renderer().render(&unreflected, at(10)).unwrap_err();
    assert_eq!(err.kind_name(), "TemplateError");

    let undefined = unreflected.clone().with_facts(ClassFacts::Object {
        endpoint: None,
        methods: vec![],
    });
    let err = renderer().render(&undefined, at(10)).unwrap_err();
    assert!(err.to_string().contains("endpoint is undefined"));

    let mismatched = unreflected.with_facts(ClassFacts::Enumeration {
        constants: ConstantMap::new(),
    });
    let err = renderer().render(&mismatched, at(10)).unwrap_err();
    assert!(err.to_string().contains("do not match kind 'object'"));
}

#[test]
fn test_documentation_is_single_line_and_xml_safe() {
    let mut descriptor = campaign();
    if let Some(ClassFacts::Object { methods, .. }) = descriptor.facts.as_mut() {
        methods[0].documentation = "Ads <b>with</b>\n  & more".to_string();
    }
    let text = renderer().render(&descriptor, at(10)).unwrap();
    assert!(text.contains("/// Ads &lt;b&gt;with&lt;/b&gt; &amp; more."));
}

#[test]
fn test_csharp_escape() {
    assert_eq!(csharp_escape("plain"), "plain");
    assert_eq!(csharp_escape("tab\there"), "tab\\there");
    assert_eq!(csharp_escape("\u{1}"), "\\u0001");
}

fn write_sdk(root: &std::path::Path) -> ConverterConfig {
    let object = root.join("sdk/Object");
    let fields = root.join("sdk/Object/Fields");
    let values = root.join("sdk/Object/Values");
    for dir in [&object, &fields, &values] {
        fs::create_dir_all(dir).unwrap();
    }
    for i in 0..6 {
        fs::write(
            object.join(format!("Thing{i}.php")),
            format!(
                "<?php\nnamespace FacebookAds\\Object;\nclass Thing{i} {{\n  protected function getEndpoint() {{ return 'things{i}'; }}\n}}\n"
            ),
        )
        .unwrap();
    }
    fs::write(
        fields.join("ThingFields.php"),
        "<?php\nnamespace FacebookAds\\Object\\Fields;\nclass ThingFields { const ID = 'id'; }\n",
    )
    .unwrap();
    fs::write(
        values.join("ThingValues.php"),
        "<?php\nnamespace FacebookAds\\Object\\Values;\nclass ThingValues { const ON = 'ON'; }\n",
    )
    .unwrap();

    ConverterConfig {
        sdk_root: root.join("sdk"),
        output_root: root.join("out"),
        inputs: crate::descriptor::KindMap {
            object: PathBuf::from("Object"),
            fields: PathBuf::from("Object/Fields"),
            values: PathBuf::from("Object/Values"),
        },
        ..ConverterConfig::default()
    }
}

#[test]
fn test_parallel_run_matches_sequential_order() {
    let dir = temp_dir();
    let config = write_sdk(&dir);

    let sequential = Converter::new(config.clone()).run_at(at(9)).unwrap();
    let parallel = Converter::new(ConverterConfig { jobs: 4, ..config })
        .run_at(at(9))
        .unwrap();

    assert_eq!(sequential.discovered, 8);
    assert_eq!(sequential.succeeded(), 8);
    assert_eq!(parallel.succeeded(), 8);
    assert_eq!(sequential.lines(), parallel.lines());
    let indices: Vec<_> = parallel.outcomes.iter().map(|o| o.index).collect();
    assert_eq!(indices, (0..8).collect::<Vec<_>>());
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_dry_run_writes_nothing() {
    let dir = temp_dir();
    let config = write_sdk(&dir);
    let report = Converter::new(config).dry_run(true).run_at(at(9)).unwrap();
    assert_eq!(report.succeeded(), 8);
    assert!(report
        .outcomes
        .iter()
        .all(|o| matches!(o.status, FileStatus::Planned(_))));
    assert!(!dir.join("out").exists());
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_inspect_reflects_without_writing() {
    let dir = temp_dir();
    let config = write_sdk(&dir);
    let inspected = Converter::new(config).inspect().unwrap();
    assert_eq!(inspected.len(), 8);
    assert!(inspected.iter().all(|i| i.error.is_none()));
    let fields = inspected
        .iter()
        .map(|i| &i.descriptor)
        .find(|d| d.short_name == "ThingFields")
        .unwrap();
    assert_eq!(fields.constants().unwrap().get("ID"), Some("id"));
    assert!(!dir.join("out").exists());
    fs::remove_dir_all(&dir).unwrap();
}
