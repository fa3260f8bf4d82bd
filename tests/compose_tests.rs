use treemark::{compose, compose_literal, parse, ComposeConfig, Node, Object};

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn sample_tree() -> Node {
    let mut b = Object::new();
    b.set_attribute("x", "y");
    let mut root = Object::new();
    root.insert("A", "1");
    root.insert("B", Node::Object(b));
    Node::Object(root)
}

#[test]
fn test_compose_indented() {
    let out = compose("Doc", &sample_tree(), &ComposeConfig::default());
    assert_eq!(
        out,
        "<?xml version=\"1.0\"?>\n<Doc>\n\t<A>1</A>\n\t<B x=\"y\"/>\n</Doc>\n"
    );
}

#[test]
fn test_compose_compressed() {
    let config = ComposeConfig {
        compress: true,
        ..ComposeConfig::default()
    };
    let out = compose("Doc", &sample_tree(), &config);
    assert_eq!(out, "<?xml version=\"1.0\"?><Doc><A>1</A><B x=\"y\"/></Doc>");
}

#[test]
fn test_compose_custom_indent() {
    let config = ComposeConfig {
        indent: "  ".to_string(),
        ..ComposeConfig::default()
    };
    let out = compose("Doc", &sample_tree(), &config);
    assert!(out.contains("\n  <A>1</A>\n"));
}

#[test]
fn test_compose_dtd_passthrough() {
    let config = ComposeConfig {
        dtd: Some("<!DOCTYPE Doc SYSTEM \"doc.dtd\">".to_string()),
        ..ComposeConfig::default()
    };
    let out = compose("Doc", &sample_tree(), &config);
    assert!(out.starts_with("<?xml version=\"1.0\"?>\n<!DOCTYPE Doc SYSTEM \"doc.dtd\">\n<Doc>"));
}

#[test]
fn test_compose_escaping() {
    let mut root = Object::new();
    root.insert("T", "a < b & c > d \" q");
    let mut attr_elem = Object::new();
    attr_elem.set_attribute("k", "he said \"hi\" & left <");
    root.insert("E", Node::Object(attr_elem));

    let out = compose("Doc", &Node::Object(root), &ComposeConfig::default());
    assert!(out.contains("<T>a &lt; b &amp; c &gt; d \" q</T>"));
    assert!(out.contains("<E k=\"he said &quot;hi&quot; &amp; left &lt;\"/>"));
}

#[test]
fn test_compose_array_renders_siblings() {
    let mut root = Object::new();
    root.insert(
        "Item",
        Node::Array(vec![Node::Scalar("a".into()), Node::Scalar("b".into())]),
    );
    let out = compose("Doc", &Node::Object(root), &ComposeConfig::default());
    assert!(out.contains("\t<Item>a</Item>\n\t<Item>b</Item>\n"));
}

#[test]
fn test_compose_inline_text_with_attributes() {
    let mut elem = Object::new();
    elem.set_attribute("lang", "en");
    elem.set_text("hello");
    let mut root = Object::new();
    root.insert("G", Node::Object(elem));
    let out = compose("Doc", &Node::Object(root), &ComposeConfig::default());
    assert!(out.contains("<G lang=\"en\">hello</G>"));
}

#[test]
fn test_compose_scalar_root() -> TestResult {
    let out = compose("Doc", &Node::Scalar("v".into()), &ComposeConfig::default());
    assert_eq!(out, "<?xml version=\"1.0\"?>\n<Doc>v</Doc>\n");
    let doc = parse(&out)?;
    assert_eq!(doc.root, Node::Scalar("v".into()));
    Ok(())
}

fn nested_tree() -> Node {
    let mut inner = Object::new();
    inner.insert("c", "hi");
    let mut root = Object::new();
    root.insert("a", "1");
    root.insert("b", Node::Object(inner));
    Node::Object(root)
}

#[test]
fn test_literal_indented() {
    let out = compose_literal(&nested_tree(), &ComposeConfig::default());
    assert_eq!(out, "{\n\t\"a\": 1,\n\t\"b\": {\n\t\t\"c\": \"hi\"\n\t}\n};\n");
}

#[test]
fn test_literal_compressed() {
    let config = ComposeConfig {
        compress: true,
        ..ComposeConfig::default()
    };
    let out = compose_literal(&nested_tree(), &config);
    assert_eq!(out, "{\"a\": 1,\"b\": {\"c\": \"hi\"}};");
}

#[test]
fn test_literal_array() {
    let mut root = Object::new();
    root.insert(
        "List",
        Node::Array(vec![Node::Scalar("x".into()), Node::Scalar("2".into())]),
    );
    let out = compose_literal(&Node::Object(root), &ComposeConfig::default());
    assert_eq!(out, "{\n\t\"List\": [\n\t\t\"x\",\n\t\t2\n\t]\n};\n");
}

#[test]
fn test_literal_attributes_are_ordinary_keys() {
    let mut elem = Object::new();
    elem.set_attribute("Name", "A");
    elem.set_text("hi");
    let out = compose_literal(&Node::Object(elem), &ComposeConfig::default());
    assert_eq!(out, "{\n\t\"Name\": \"A\",\n\t\"#text\": \"hi\"\n};\n");
}

#[test]
fn test_literal_escaping_example() {
    let out = compose_literal(
        &Node::Scalar("he said \"hi\"\n".into()),
        &ComposeConfig::default(),
    );
    assert_eq!(out, "\"he said \\\"hi\\\"\\n\";\n");
}

#[test]
fn test_literal_script_close_is_split() {
    let out = compose_literal(
        &Node::Scalar("</script><b>".into()),
        &ComposeConfig::default(),
    );
    assert!(out.contains("</scr\" + \"ipt><b>"));

    let upper = compose_literal(&Node::Scalar("</SCRIPT>".into()), &ComposeConfig::default());
    assert!(upper.contains("</scr\" + \"ipt>"));
}

#[test]
fn test_literal_numeric_heuristic() {
    let config = ComposeConfig::default();
    assert_eq!(compose_literal(&Node::Scalar("42".into()), &config), "42;\n");
    assert_eq!(
        compose_literal(&Node::Scalar("-3.14".into()), &config),
        "-3.14;\n"
    );
    assert_eq!(
        compose_literal(&Node::Scalar("007".into()), &config),
        "\"007\";\n"
    );
    assert_eq!(
        compose_literal(&Node::Scalar("1e5".into()), &config),
        "\"1e5\";\n"
    );
}

#[test]
fn test_literal_force_strings() {
    let config = ComposeConfig {
        force_strings: true,
        ..ComposeConfig::default()
    };
    let mut root = Object::new();
    root.insert("n", "42");
    let out = compose_literal(&Node::Object(root), &config);
    assert_eq!(out, "{\n\t\"n\": \"42\"\n};\n");
}

#[test]
fn test_literal_empty_object() {
    let out = compose_literal(&Node::Object(Object::new()), &ComposeConfig::default());
    assert_eq!(out, "{\n};\n");
}
