use criterion::criterion_group;
use criterion::criterion_main;
use criterion::BenchmarkId;
use criterion::Criterion;
use criterion::Throughput;
use http::HeaderMap;
use http::Method;
use http::Uri;
use s3sign_aws_v4::ChunkedBody;
use s3sign_aws_v4::ChunkedSigner;
use s3sign_aws_v4::Credential;
use s3sign_aws_v4::RequestSigner;
use s3sign_aws_v4::SigningContext;

criterion_group!(benches, bench_header, bench_chunked);
criterion_main!(benches);

fn credential() -> Credential {
    Credential::new("access_key_id", "secret_access_key")
}

pub fn bench_header(c: &mut Criterion) {
    let mut group = c.benchmark_group("aws_v4");
    let cred = credential();
    let signer = RequestSigner::new("s3", "test");

    group.bench_function("sign_request", |b| {
        b.iter(|| {
            let mut req = http::Request::new("");
            *req.method_mut() = Method::GET;
            *req.uri_mut() = "http://127.0.0.1:9000/hello"
                .parse()
                .expect("url must be valid");

            let (mut parts, _) = req.into_parts();
            signer
                .sign_request(&mut parts, Some(&cred), None)
                .expect("must success")
        })
    });

    group.bench_function("presign_request", |b| {
        b.iter(|| {
            let mut req = http::Request::new("");
            *req.method_mut() = Method::GET;
            *req.uri_mut() = "http://127.0.0.1:9000/hello?list-type=2"
                .parse()
                .expect("url must be valid");

            let (mut parts, _) = req.into_parts();
            signer
                .sign_request(
                    &mut parts,
                    Some(&cred),
                    Some(std::time::Duration::from_secs(3600)),
                )
                .expect("must success")
        })
    });

    group.finish();
}

pub fn bench_chunked(c: &mut Criterion) {
    let mut group = c.benchmark_group("aws_v4_chunked");
    let cred = credential();
    let uri: Uri = "http://127.0.0.1:9000/bucket/object"
        .parse()
        .expect("url must be valid");
    let ctx = SigningContext::new(Method::PUT, &uri, "test", "s3").expect("must success");

    for size in [64 * 1024, 1024 * 1024] {
        let data = vec![0x5au8; size];
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &data, |b, data| {
            b.iter(|| {
                let mut headers = HeaderMap::new();
                ChunkedSigner::prepare_headers(&mut headers, data.len() as u64, 64 * 1024)
                    .expect("must success");

                let mut signer = ChunkedSigner::new(&ctx);
                signer
                    .compute_signature(&mut headers, "", &cred)
                    .expect("must success");

                ChunkedBody::new(signer, data.as_slice(), 64 * 1024)
                    .expect("must success")
                    .map(|chunk| chunk.expect("must success").len())
                    .sum::<usize>()
            })
        });
    }

    group.finish();
}
