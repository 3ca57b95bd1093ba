use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use disaster_tagger::ml::tfidf::{TfidfParams, TfidfTransformer};
use disaster_tagger::ml::vectorize::{CountVectorizer, VectorizerParams};
use disaster_tagger::text::tokenize;

const MESSAGE_COUNT: usize = 1_000;

const PHRASES: [&str; 8] = [
    "We need clean drinking water and food in the camp",
    "People are trapped under the collapsed buildings",
    "The roads to the hospital are blocked by floods",
    "Children don't have shelter since the storm hit",
    "Please send medical supplies, many injured",
    "Power lines are down across the northern districts",
    "Is there any news about the aid convoy?",
    "Volunteers are distributing blankets and tents",
];

fn messages() -> Vec<String> {
    (0..MESSAGE_COUNT)
        .map(|i| format!("{} #{i}", PHRASES[i % PHRASES.len()]))
        .collect()
}

fn bench_tokenize(c: &mut Criterion) {
    let docs = messages();
    c.bench_with_input(BenchmarkId::new("tokenize", MESSAGE_COUNT), &docs, |b, docs| {
        b.iter(|| {
            for doc in docs {
                black_box(tokenize(black_box(doc)));
            }
        });
    });
}

fn bench_vectorize(c: &mut Criterion) {
    let docs = messages();
    c.bench_with_input(
        BenchmarkId::new("count_then_tfidf", MESSAGE_COUNT),
        &docs,
        |b, docs| {
            b.iter(|| {
                let mut vect = CountVectorizer::new(VectorizerParams::default());
                let counts = vect.fit_transform(black_box(docs)).expect("fit vectorizer");
                let mut tfidf = TfidfTransformer::new(TfidfParams::default());
                tfidf.fit(&counts, vect.n_features()).expect("fit tfidf");
                black_box(tfidf.transform(counts).expect("transform"))
            });
        },
    );
}

criterion_group!(benches, bench_tokenize, bench_vectorize);
criterion_main!(benches);
