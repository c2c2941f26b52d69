use criterion::{black_box, criterion_group, criterion_main, Criterion};
use folio_dom::markup;
use folio_editor::repair::repair_container;
use folio_editor::{EditorContext, Element, SchemaConfig, Tree};

fn repair(source: &str) -> String {
    let mut tree = Tree::new(Element::new("div"));
    let root = tree.root();
    let _ = markup::parse_into(&mut tree, root, source);
    let mut ctx = EditorContext::new(SchemaConfig::default(), root);
    repair_container(&mut tree, &mut ctx, root);
    markup::serialize_children(&tree, root)
}

fn repair_valid_document(c: &mut Criterion) {
    let source = "<p>Intro with <b>bold</b> and <i>italic</i><br></p>".repeat(50);

    c.bench_function("repair_valid_document", |b| {
        b.iter(|| repair(black_box(&source)))
    });
}

fn repair_pasted_markup(c: &mut Criterion) {
    let source = r#"
        <div>Loose text <span>inside</span> a div
            <section>
                <h1><b>Heading</b></h1>
                <ul><li>one</li>two<li><u>three</u></li></ul>
                <blockquote class="aside">quoted<p>para</p></blockquote>
            </section>
        </div>
        <p><b><b>nested</b></b> run</p>
    "#
    .repeat(20);

    c.bench_function("repair_pasted_markup", |b| {
        b.iter(|| repair(black_box(&source)))
    });
}

criterion_group!(benches, repair_valid_document, repair_pasted_markup);
criterion_main!(benches);
