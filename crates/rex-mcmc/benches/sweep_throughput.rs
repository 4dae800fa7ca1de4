use criterion::{criterion_group, criterion_main, Criterion};
use rex_core::{random_mixture, MixtureSpec};

use rex_mcmc::config::{EngineOptions, ExchangeConfig, RingLevels};
use rex_mcmc::engine::ReplicaExchange;

fn bench_sweep(c: &mut Criterion) {
    let spec = MixtureSpec {
        components: 20,
        avg_scale: 0.002,
        ..MixtureSpec::default()
    };
    let mixture = random_mixture(4, &spec).unwrap();
    let options = EngineOptions {
        burn_in: 100,
        ..EngineOptions::default()
    };
    let temperatures = [1.0, 2.0, 4.0, 8.0, 16.0];

    for exchange in [
        ExchangeConfig::Pairwise,
        ExchangeConfig::RingJump {
            rings: 16,
            jump_probability: 0.1,
            levels: RingLevels::Adaptive,
        },
        ExchangeConfig::SampledSwaps,
    ] {
        c.bench_function(&format!("replica_exchange_sweep/{}", exchange.name()), |b| {
            b.iter(|| {
                let mut engine =
                    ReplicaExchange::new(&mixture, &temperatures, &exchange, options.clone(), 42)
                        .unwrap();
                engine.run(1_000).unwrap()
            })
        });
    }
}

criterion_group!(benches, bench_sweep);
criterion_main!(benches);
