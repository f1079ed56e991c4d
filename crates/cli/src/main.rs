//! Demo driver: fills a disk-resident set with random integers, cross-checks
//! it against an in-memory `BTreeSet`, and audits the file's invariants.
//!
//! Usage: `cli [n]` where `n` is the number of random inserts (default 1000).
//! Set `RUST_LOG=debug` to watch the engine's insert log.

use anyhow::{ensure, Context, Result};
use codec::I64Codec;
use diskset::DiskSet;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeSet;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let n: usize = match std::env::args().nth(1) {
        Some(arg) => arg.parse().context("element count must be an integer")?,
        None => 1000,
    };

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("demo.set");
    let mut set = DiskSet::open(&path, I64Codec)?;
    let mut reference = BTreeSet::new();
    let mut rng = StdRng::seed_from_u64(0xD15C);

    info!(n, path = %path.display(), "inserting random integers");
    for _ in 0..n {
        let v = rng.gen::<i32>() as i64;
        let inserted = set.add(&v)?;
        ensure!(
            inserted == reference.insert(v),
            "insert disagreement on {v}"
        );
    }
    ensure!(
        set.len()? == reference.len() as u64,
        "length disagreement: disk {} vs reference {}",
        set.len()?,
        reference.len()
    );

    info!("probing neighbor queries");
    for _ in 0..n {
        let q = rng.gen::<i32>() as i64;
        ensure!(
            set.higher(&q)? == reference.range(q + 1..).next().copied(),
            "higher({q}) disagreement"
        );
        ensure!(
            set.ceiling(&q)? == reference.range(q..).next().copied(),
            "ceiling({q}) disagreement"
        );
        ensure!(
            set.floor(&q)? == reference.range(..=q).next_back().copied(),
            "floor({q}) disagreement"
        );
    }

    info!("checking in-order iteration");
    let mut walked = 0u64;
    for (got, want) in set.iter().zip(reference.iter()) {
        ensure!(got? == *want, "iteration disagreement");
        walked += 1;
    }
    ensure!(
        walked == reference.len() as u64,
        "iterator stopped early at {walked}"
    );

    let stats = set.verify()?;
    let file_len = std::fs::metadata(&path)?.len();
    info!(
        nodes = stats.nodes,
        height = stats.height,
        file_len,
        "all checks passed"
    );
    set.close()?;
    Ok(())
}
