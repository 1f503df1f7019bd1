//! End-to-end rendering: content on disk, templates on disk, output files.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde_json::json;
use tempfile::TempDir;
use temple_render::{
    ContentLoader, FileSink, RenderError, Renderer, StreamSink, TemplateRegistry,
};

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn page_registry() -> TemplateRegistry {
    let mut registry = TemplateRegistry::new().unwrap();
    registry.register("page", "<h1><%= title %></h1>").unwrap();
    registry
}

#[test]
fn single_page_produces_one_file() {
    let content = ContentLoader::new()
        .load_values(
            vec![json!({"$t": "page", "title": "Hi", "$path": "index.html"})],
            ".",
        )
        .unwrap();
    let sink = Arc::new(StreamSink::new());
    let renderer = Renderer::new(Arc::new(page_registry()), Arc::new(content), sink.clone());

    let outcome = renderer.render_content();

    assert!(outcome.is_success());
    assert_eq!(outcome.output, "");
    let files = sink.files();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].path, "index.html");
    assert_eq!(files[0].contents, "<h1>Hi</h1>");
}

#[test]
fn plain_scalar_needs_no_templates() {
    let content = ContentLoader::new()
        .load_values(vec![json!("hello world")], ".")
        .unwrap();
    let sink = Arc::new(StreamSink::new());
    let templates = Arc::new(TemplateRegistry::new().unwrap());
    let renderer = Renderer::new(templates, Arc::new(content), sink.clone());

    let outcome = renderer.render_content();

    assert_eq!(outcome.output, "<span>hello world</span>");
    assert!(!outcome.output.contains("<p>"));
    assert!(sink.is_empty());
}

#[test]
fn bad_template_name_does_not_stop_siblings() {
    let content = ContentLoader::new()
        .load_values(
            vec![
                json!({"$t": "nope", "$path": "broken.html"}),
                json!({"$t": "page", "title": "Ok", "$path": "ok.html"}),
            ],
            ".",
        )
        .unwrap();
    let sink = Arc::new(StreamSink::new());
    let renderer = Renderer::new(Arc::new(page_registry()), Arc::new(content), sink.clone());

    let outcome = renderer.render_content();

    assert_eq!(outcome.failures.len(), 1);
    match &outcome.failures[0].error {
        RenderError::TemplateNotFound { name } => assert_eq!(name, "nope"),
        other => panic!("unexpected error: {other}"),
    }
    let files = sink.files();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].path, "ok.html");
}

#[test]
fn empty_content_renders_nothing() {
    for source in ["", "~\n", "[]\n"] {
        let content = ContentLoader::new().load_str(source, ".").unwrap();
        let sink = Arc::new(StreamSink::new());
        let templates = Arc::new(TemplateRegistry::new().unwrap());
        let renderer = Renderer::new(templates, Arc::new(content), sink.clone());

        let outcome = renderer.render_content();
        assert_eq!(outcome.output, "", "source {source:?}");
        assert!(sink.is_empty());
    }
}

#[test]
fn site_from_disk_with_includes_and_globals() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("src");
    let out = temp.path().join("out");

    write(
        &src,
        "templates/layout/page.html",
        "<title><%= brand %>: <%= title %></title>\n<%= render(nav) %>\n<%= render(body) %>",
    );
    write(&src, "templates/link.html", "<a href=\"<%= href %>\"><%= label %></a>");
    write(&src, "templates/post.html", "<article id=\"<%= title | slugify %>\"><%= text | markdown %></article>");

    write(
        &src,
        "content/site.yml",
        r#"
- $include: shared/globals.yml
- $t: page
  $path: index.html
  brand: Temple
  title: Home
  nav: { $ref: nav }
  body:
    - Welcome *home*.
    - $include: posts.yml
- $t: page
  $path: about/index.html
  brand: Temple
  title: About
  nav: { $ref: nav }
  body: |
    First paragraph.

    Second paragraph.
"#,
    );
    write(
        &src,
        "content/shared/globals.yml",
        r#"
- $globals:
    nav:
      - { $t: link, href: /, label: Home }
      - { $t: link, href: /about/, label: About }
"#,
    );
    write(
        &src,
        "content/posts.yml",
        "- { $t: post, title: First Post, text: \"Hello **there**\" }\n",
    );

    let mut registry = TemplateRegistry::new().unwrap();
    assert_eq!(registry.load_dir(src.join("templates")).unwrap(), 3);
    let content = ContentLoader::new()
        .load_path(src.join("content/site.yml"))
        .unwrap();
    assert_eq!(content.document_count(), 2);

    let sink = Arc::new(FileSink::new(&out));
    let renderer = Renderer::new(Arc::new(registry), Arc::new(content), sink.clone());
    let outcome = renderer.render_content();

    assert!(outcome.is_success(), "failures: {:?}", outcome.failures);
    assert_eq!(outcome.output, "");
    assert_eq!(sink.written().len(), 2);

    let index = fs::read_to_string(out.join("index.html")).unwrap();
    assert_eq!(
        index,
        "<title>Temple: Home</title>\n\
         <a href=\"/\">Home</a>\n<a href=\"/about/\">About</a>\n\
         <span>Welcome <em>home</em>.</span>\n\
         <article id=\"first-post\"><p>Hello <strong>there</strong></p></article>"
    );

    let about = fs::read_to_string(out.join("about/index.html")).unwrap();
    assert!(about.starts_with("<title>Temple: About</title>"));
    assert!(about.ends_with("<p>First paragraph.</p>\n<p>Second paragraph.</p>"));
}

#[test]
fn include_cycle_is_reported_once() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "a.yml", "- a\n- $include: b.yml\n");
    write(temp.path(), "b.yml", "- b\n- $include: a.yml\n");

    let content = ContentLoader::new()
        .load_path(temp.path().join("a.yml"))
        .unwrap();
    let sink = Arc::new(StreamSink::new());
    let templates = Arc::new(TemplateRegistry::new().unwrap());
    let renderer = Renderer::new(templates, Arc::new(content), sink);

    let outcome = renderer.render_content();

    assert_eq!(outcome.failures.len(), 1);
    assert!(matches!(
        outcome.failures[0].error,
        RenderError::Cycle { .. }
    ));
    assert!(outcome
        .output
        .starts_with("<span>a</span>\n<span>b</span>\n<span>a</span>\n<span class=\"temple-error\">cyclic reference: $include"));
}

#[test]
fn same_template_name_in_subdirectory_overwrites() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "foo.html", "first");
    write(temp.path(), "bar/foo.txt", "second");

    let mut registry = TemplateRegistry::new().unwrap();
    registry.load_dir(temp.path()).unwrap();

    assert_eq!(registry.len(), 1);
    let template = registry.resolve("foo").unwrap();
    assert_eq!(template.render(()).unwrap(), "second");
}
