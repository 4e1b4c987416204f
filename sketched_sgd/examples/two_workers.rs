//! Two workers minimizing a small least-squares objective with sketched
//! gradient aggregation. Run with `RUST_LOG=debug` to watch the per-step
//! ingestion and recovery.

use std::num::NonZeroUsize;

use log::info;
use sketched_sgd::{
    AggregationMode, GradientDescent, Result, SketchConfig, SketchedSgd, SketchedSgdConfig,
};

const DIM: usize = 16;
const SAMPLES: usize = 8;
const WORKERS: usize = 2;
const STEPS: usize = 200;

fn sample(i: usize) -> (Vec<f32>, f32) {
    let x: Vec<f32> = (0..DIM).map(|j| ((i * DIM + j) % 7) as f32).collect();
    (x, i as f32)
}

fn shard_gradients(params: &[f32]) -> Vec<Vec<f32>> {
    let per_worker = SAMPLES / WORKERS;

    (0..WORKERS)
        .map(|w| {
            let mut grad = vec![0.0f32; DIM];
            for i in (w * per_worker)..((w + 1) * per_worker) {
                let (x, y) = sample(i);
                let err: f32 =
                    params.iter().zip(&x).map(|(p, v)| p * v).sum::<f32>() - y;
                for (g, v) in grad.iter_mut().zip(&x) {
                    *g += 2.0 * err * v;
                }
            }
            grad
        })
        .collect()
}

fn loss(params: &[f32]) -> f32 {
    (0..SAMPLES)
        .map(|i| {
            let (x, y) = sample(i);
            let err: f32 = params.iter().zip(&x).map(|(p, v)| p * v).sum::<f32>() - y;
            err * err
        })
        .sum()
}

fn nz(n: usize) -> NonZeroUsize {
    NonZeroUsize::new(n).unwrap()
}

fn main() -> Result<()> {
    env_logger::init();

    let mut optimizer = SketchedSgd::new(
        GradientDescent::new(0.001),
        SketchConfig::new(nz(5), nz(64), 42),
        SketchedSgdConfig::new(nz(4), nz(WORKERS), true, 0.9, 0, 1),
        DIM,
        AggregationMode::Sketched,
    )?;

    let mut params = vec![0.0f32; DIM];
    info!("initial loss: {}", loss(&params));

    for step in 0..STEPS {
        let grads = shard_gradients(&params);
        let update = optimizer.step(&mut params, &grads)?;

        if step % 20 == 0 {
            info!(
                "step {step}: loss={}, applied {} coordinates",
                loss(&params),
                update.len()
            );
        }
    }

    info!("final loss: {}", loss(&params));
    Ok(())
}
