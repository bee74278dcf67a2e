use criterion::{black_box, criterion_group, criterion_main, Criterion};
use gatehouse::auth::ticket;
use gatehouse::auth::Session;

fn bench_ticket_codec(c: &mut Criterion) {
    c.bench_function("ticket_encode", |b| {
        b.iter(|| ticket::encode(black_box("alice"), black_box("secret")))
    });

    let value = ticket::encode("alice", "secret").unwrap();
    c.bench_function("ticket_decode", |b| {
        b.iter(|| ticket::decode(black_box(&value)))
    });
}

fn bench_session(c: &mut Criterion) {
    c.bench_function("session_new", |b| b.iter(Session::new));

    c.bench_function("session_set_uid", |b| {
        b.iter(|| {
            let mut session = Session::new();
            session.set_uid(black_box("u1"));
            session
        })
    });

    let session = Session::new();
    c.bench_function("session_to_json", |b| {
        b.iter(|| serde_json::to_string(black_box(&session)))
    });
}

criterion_group!(benches, bench_ticket_codec, bench_session);
criterion_main!(benches);
