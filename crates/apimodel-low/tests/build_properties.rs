/*
 * build_properties.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * End-to-end build behavior over whole documents.
 */

use std::sync::{Arc, Mutex};

use apimodel_low::index::reference_value_node;
use apimodel_low::low::extract_map_no_lookup;
use apimodel_low::model::{Paths, Responses};
use apimodel_low::{
    BuildConfig, BuildContext, BuildError, BuildObserver, Buildable, FailurePolicy,
    HasExtensions, Hashable, IndexConfig, Reference, ReferenceIndex, SpecIndex,
};
use apimodel_yaml::{Node, NodeKind, parse};

const PETSTORE: &str = r#"
openapi: 3.1.0
paths:
  /pets:
    $ref: '#/components/pathItems/Pets'
  /pets/{id}:
    summary: a single pet
    get:
      operationId: showPet
      responses:
        "200":
          description: the pet
        default:
          $ref: '#/components/responses/Error'
  x-internal: true
components:
  pathItems:
    Pets:
      summary: all the pets
      get:
        operationId: listPets
        tags: [pets]
        responses:
          "200":
            description: a list of pets
  responses:
    Error:
      description: unexpected error
"#;

/// Builds a `Paths` from the `paths` key of `document`.
fn build_paths<'a>(
    cx: &BuildContext,
    document: &'a Node,
    index: &dyn ReferenceIndex<'a>,
) -> apimodel_low::Result<Paths<'a>> {
    let root = document.get("paths").unwrap();
    let mut paths = Paths::default();
    paths.build(cx, None, root, index)?;
    Ok(paths)
}

/// A scalar-valued object, for collections of plain values.
#[derive(Debug, Default)]
struct Count<'a> {
    value: i64,
    reference: Reference<'a>,
}

impl<'a> Buildable<'a> for Count<'a> {
    const OBJECT: &'static str = "count";

    fn build(
        &mut self,
        cx: &BuildContext,
        key: Option<&'a Node>,
        root: &'a Node,
        _idx: &dyn ReferenceIndex<'a>,
    ) -> apimodel_low::Result<()> {
        cx.check_cancelled()?;
        self.value = root
            .value
            .parse()
            .map_err(|_| BuildError::malformed_root(Self::OBJECT, NodeKind::Scalar, root))?;
        self.reference = Reference::new(key, root);
        Ok(())
    }

    fn reference(&self) -> &Reference<'a> {
        &self.reference
    }

    fn reference_mut(&mut self) -> &mut Reference<'a> {
        &mut self.reference
    }
}

#[derive(Default)]
struct Recording {
    dropped: Mutex<Vec<String>>,
}

impl BuildObserver for Recording {
    fn on_entry_dropped(&self, object: &str, error: &BuildError) {
        self.dropped
            .lock()
            .unwrap()
            .push(format!("{}: {}", object, error));
    }
}

#[test]
fn extensions_are_isolated_from_children() {
    let document = parse("a: 1\nx-foo: 2\nb: 3\n").unwrap();
    let index = SpecIndex::new(&document);
    let children =
        extract_map_no_lookup::<Count>(&BuildContext::new(), "counts", &document, &index)
            .unwrap();
    let extensions = apimodel_low::extract_extensions(&document);

    let built: Vec<(&str, i64)> = children
        .iter()
        .map(|(k, v)| (k.value.as_str(), v.value.value))
        .collect();
    assert_eq!(built, vec![("a", 1), ("b", 3)]);
    assert_eq!(extensions.len(), 1);
    assert_eq!(extensions.get("x-foo").unwrap().value, 2);
}

#[test]
fn paths_keep_extensions_out_of_path_items() {
    let document = parse(PETSTORE).unwrap();
    let index = SpecIndex::new(&document);
    let paths = build_paths(&BuildContext::new(), &document, &index).unwrap();

    assert_eq!(paths.path_items.len(), 2);
    assert!(paths.find_path("x-internal").is_none());
    assert_eq!(paths.find_extension("x-internal").unwrap().value, true);
}

#[test]
fn default_response_is_lifted_out_of_codes() {
    let document = parse(
        "\"200\": {description: ok}\ndefault: {description: fallback}\nx-bar: 1\n",
    )
    .unwrap();
    let index = SpecIndex::new(&document);
    let mut responses = Responses::default();
    responses
        .build(&BuildContext::new(), None, &document, &index)
        .unwrap();

    assert!(responses.find_by_key("default").is_none());
    assert!(responses.find_by_key("200").is_some());
    let default = responses.default_response().unwrap();
    assert_eq!(default.value.description.as_ref().unwrap().value, "fallback");
    let extension_keys: Vec<&str> = responses
        .extensions()
        .keys()
        .map(|k| k.value.as_str())
        .collect();
    assert_eq!(extension_keys, vec!["x-bar"]);
}

#[test]
fn path_references_resolve_transparently() {
    let document = parse(PETSTORE).unwrap();
    let index = SpecIndex::new(&document);
    let paths = build_paths(&BuildContext::new(), &document, &index).unwrap();

    let pets = &paths.find_path("/pets").unwrap().value;
    assert_eq!(pets.summary.as_ref().unwrap().value, "all the pets");
    assert_eq!(pets.reference.reference, Some("#/components/pathItems/Pets"));
    assert!(!pets.reference.circular);
    let list = &pets.find_operation("get").unwrap().value;
    assert_eq!(list.operation_id.as_ref().unwrap().value, "listPets");

    // the resolved value node is the target, not the reference marker
    let value_node = paths.find_path("/pets").unwrap().value_node;
    assert!(value_node.get("$ref").is_none());
    assert!(value_node.get("summary").is_some());

    let single = &paths.find_path("/pets/{id}").unwrap().value;
    let responses = &single
        .find_operation("get")
        .unwrap()
        .value
        .responses
        .as_ref()
        .unwrap()
        .value;
    let default = responses.default_response().unwrap();
    assert_eq!(
        default.value.description.as_ref().unwrap().value,
        "unexpected error"
    );
    assert_eq!(
        default.value.reference.reference,
        Some("#/components/responses/Error")
    );
}

const CYCLE: &str = r#"
paths:
  /a:
    $ref: '#/paths/~1b'
  /b:
    $ref: '#/paths/~1a'
  /c:
    summary: fine
"#;

#[test]
fn circular_reference_rejected_when_not_allowed() {
    let document = parse(CYCLE).unwrap();
    let index = SpecIndex::new(&document);
    let err = build_paths(&BuildContext::new(), &document, &index).unwrap_err();

    match err.root_cause() {
        BuildError::CircularReferenceRejected {
            reference, journey, ..
        } => {
            assert!(reference == "#/paths/~1a" || reference == "#/paths/~1b");
            assert_eq!(journey.first(), journey.last());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn circular_reference_rejected_even_when_collecting() {
    let document = parse(CYCLE).unwrap();
    let index = SpecIndex::new(&document);
    let cx = BuildContext::with_config(
        BuildConfig::default().with_failure_policy(FailurePolicy::CollectAndContinue),
    );
    let err = build_paths(&cx, &document, &index).unwrap_err();
    assert!(matches!(
        err.root_cause(),
        BuildError::CircularReferenceRejected { .. }
    ));
}

#[test]
fn circular_reference_flagged_when_allowed() {
    let document = parse(CYCLE).unwrap();
    let index = SpecIndex::with_config(
        &document,
        IndexConfig {
            allow_circular_references: true,
        },
    );
    let paths = build_paths(&BuildContext::new(), &document, &index).unwrap();

    assert_eq!(paths.path_items.len(), 3);
    let a = &paths.find_path("/a").unwrap().value;
    assert!(a.reference.circular);
    assert_eq!(a.reference.reference, Some("#/paths/~1b"));
    assert!(!paths.find_path("/c").unwrap().value.reference.circular);
}

#[test]
fn unresolvable_reference_reports_text_and_position() {
    let document = parse("paths:\n  /pets:\n    $ref: '#/components/pathItems/Gone'\n").unwrap();
    let index = SpecIndex::new(&document);
    let err = build_paths(&BuildContext::new(), &document, &index).unwrap_err();

    let reference_node = document.get("paths").unwrap().get("/pets").unwrap();
    let text = reference_value_node(reference_node).unwrap();
    assert_eq!(
        err.root_cause(),
        &BuildError::UnresolvableReference {
            reference: "#/components/pathItems/Gone".into(),
            line: text.line(),
            column: text.column(),
        }
    );
    assert!(err.to_string().contains("#/components/pathItems/Gone"));
}

#[test]
fn collect_and_continue_drops_and_reports() {
    let document = parse(
        "paths:\n  /ok:\n    summary: fine\n  /gone:\n    $ref: '#/nowhere'\n  /bad: [1]\n",
    )
    .unwrap();
    let recording = Arc::new(Recording::default());
    let index = SpecIndex::new(&document).with_observer(recording.clone());
    let cx = BuildContext::with_config(
        BuildConfig::default().with_failure_policy(FailurePolicy::CollectAndContinue),
    );

    let paths = build_paths(&cx, &document, &index).unwrap();

    assert_eq!(paths.path_items.len(), 1);
    assert!(paths.find_path("/ok").is_some());
    let mut dropped: Vec<String> = cx
        .dropped()
        .into_iter()
        .map(|entry| format!("{}: {}", entry.object, entry.error.root_cause()))
        .collect();
    dropped.sort();
    assert_eq!(dropped.len(), 2);
    assert!(dropped[0].contains("cannot find reference: #/nowhere"));
    assert!(dropped[1].contains("expected a mapping node but found a sequence"));
    assert_eq!(recording.dropped.lock().unwrap().len(), 2);
}

#[test]
fn propagate_fails_on_first_bad_entry() {
    let document = parse("paths:\n  /ok:\n    summary: fine\n  /bad: [1]\n").unwrap();
    let index = SpecIndex::new(&document);
    let err = build_paths(&BuildContext::new(), &document, &index).unwrap_err();
    match err {
        BuildError::ChildBuildFailed { object, key, .. } => {
            assert_eq!(object, "paths");
            assert_eq!(key, "/bad");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn repeated_concurrent_builds_hash_identically() {
    let mut yaml = String::from("paths:\n");
    for i in 0..64 {
        yaml.push_str(&format!(
            "  /r{i}:\n    summary: resource {i}\n    get:\n      operationId: get{i}\n      responses:\n        \"200\": {{description: ok}}\n"
        ));
    }
    let document = parse(&yaml).unwrap();
    let index = SpecIndex::new(&document);
    let cx = BuildContext::with_config(BuildConfig::default().with_workers(8));

    let first = build_paths(&cx, &document, &index).unwrap().hash();
    for _ in 0..10 {
        let paths = build_paths(&cx, &document, &index).unwrap();
        assert_eq!(paths.path_items.len(), 64);
        assert_eq!(paths.hash(), first);
    }
}

#[test]
fn preserve_order_follows_document() {
    let document = parse(
        "paths:\n  /z: {}\n  /a: {}\n  x-skip: 1\n  /m: {}\n  /b: {}\n  /y: {}\n",
    )
    .unwrap();
    let index = SpecIndex::new(&document);
    let cx = BuildContext::with_config(
        BuildConfig::default()
            .with_workers(4)
            .with_preserve_order(true),
    );
    let paths = build_paths(&cx, &document, &index).unwrap();
    let keys: Vec<&str> = paths.path_items.keys().map(|k| k.value.as_str()).collect();
    insta::assert_snapshot!(keys.join(","), @"/z,/a,/m,/b,/y");
}

#[test]
fn cancelled_context_fails_build() {
    let document = parse(PETSTORE).unwrap();
    let index = SpecIndex::new(&document);
    let cx = BuildContext::new();
    cx.cancellation().cancel();
    let err = build_paths(&cx, &document, &index).unwrap_err();
    assert!(err.is_cancelled());
}

#[test]
fn malformed_paths_root_reports_position() {
    let document = parse("openapi: 3.1.0\npaths: nope\n").unwrap();
    let index = SpecIndex::new(&document);
    let err = build_paths(&BuildContext::new(), &document, &index).unwrap_err();
    let root = document.get("paths").unwrap();
    assert_eq!(err.position(), Some((root.line(), root.column())));
    assert!(matches!(err, BuildError::MalformedRoot { object: "paths", .. }));
}
