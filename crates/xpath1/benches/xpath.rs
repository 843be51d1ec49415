use criterion::{black_box, criterion_group, criterion_main, Criterion};

use xpath1::simple_node::{attr, doc, elem, text, SimpleNodeBuilder};
use xpath1::{Compiler, SimpleNode};

fn sample_queries() -> Vec<&'static str> {
    vec![
        "1 + 2 * 3",
        "string-length('Lorem ipsum dolor sit amet, consectetur adipiscing elit.')",
        "/library/shelf/book[@genre='fantasy'][position() < 5]/@id",
        "//book[author = 'Tolkien'] | //book[@genre='history']",
        "count(//book[starts-with(@id, 'b1')])",
    ]
}

fn build_sample_document() -> SimpleNode {
    let mut library = elem("library");
    for s in 0..10 {
        let mut shelf = elem("shelf").attr(attr("row", &s.to_string()));
        for b in 0..20 {
            let id = format!("b{}{}", s, b);
            let genre = if b % 2 == 0 { "fantasy" } else { "history" };
            let book: SimpleNodeBuilder = elem("book")
                .attr(attr("id", &id))
                .attr(attr("genre", genre))
                .child(elem("author").child(text(if b % 3 == 0 {
                    "Tolkien"
                } else {
                    "Gibbon"
                })))
                .child(elem("title").child(text("A Title")));
            shelf = shelf.child(book);
        }
        library = library.child(shelf);
    }
    doc().child(library).build()
}

fn benchmark_compile(c: &mut Criterion) {
    let compiler = Compiler::<SimpleNode>::new();
    let queries = sample_queries();
    c.bench_function("compiler/compile", |b| {
        b.iter(|| {
            for q in &queries {
                let compiled = compiler.compile(black_box(q)).expect("compile failure");
                black_box(compiled);
            }
        })
    });
}

fn benchmark_eval(c: &mut Criterion) {
    let compiler = Compiler::<SimpleNode>::new();
    let document = build_sample_document();
    let queries = [
        "count(//book)",
        "//book[@genre='fantasy']/title",
        "string(/library/shelf[5]/book[1]/author)",
        "sum(//shelf/@row)",
    ];
    let compiled: Vec<_> = queries
        .iter()
        .map(|q| compiler.compile(q).expect("compile failure"))
        .collect();
    c.bench_function("evaluator/eval", |b| {
        b.iter(|| {
            for x in &compiled {
                let r = x.eval(Some(black_box(&document)), None).expect("eval failure");
                black_box(r);
            }
        })
    });
}

criterion_group!(benches, benchmark_compile, benchmark_eval);
criterion_main!(benches);
