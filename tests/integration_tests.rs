mod common;

use std::fs;

use common::init_tracing;
use prime_search::{
    ComputationWorker, DiagnosticLog, MemorySink, OutputMode, ProbablePrimeGenerator,
    ResultWriter, ValueSize, WorkOutcome,
};
use tempfile::TempDir;

fn find_primes(bits: u64, quantity: usize) -> Vec<num_bigint::BigUint> {
    let mut worker = ComputationWorker::with_log(
        ProbablePrimeGenerator::default(),
        DiagnosticLog::new(MemorySink::new()),
    );

    (0..quantity)
        .map(|_| {
            assert!(worker.start_worker(bits), "Worker should accept a new run");
            worker.wait();
            match worker.take_outcome() {
                Some(WorkOutcome::Success(prime)) => prime,
                other => panic!("Expected a prime, got {:?}", other.map(|o| o.kind())),
            }
        })
        .collect()
}

#[test]
fn verbose_session_appends_headed_blocks() {
    init_tracing();
    let dir = TempDir::new().expect("Temp dir should be created");
    let path = dir.path().join("Primes.txt");
    let writer = ResultWriter::new(&path, OutputMode::Verbose);

    let primes = find_primes(96, 2);
    for prime in &primes {
        writer.append(prime).expect("Append should succeed");
    }

    let content = fs::read_to_string(&path).expect("Output should exist");
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 6);

    for (block, prime) in lines.chunks(3).zip(&primes) {
        let size = ValueSize::of(prime);
        assert_eq!(
            block[0],
            format!("{} bit prime ({} digits):", size.bits, size.digits)
        );
        assert_eq!(block[1], prime.to_string());
        assert_eq!(block[2], "");
        assert_eq!(size.bits, 96);
    }
}

#[test]
fn compact_session_appends_one_line_per_prime() {
    init_tracing();
    let dir = TempDir::new().expect("Temp dir should be created");
    let path = dir.path().join("Primes.txt");
    fs::write(&path, "existing\n").expect("Seed file should be written");
    let writer = ResultWriter::new(&path, OutputMode::Compact);

    let primes = find_primes(64, 3);
    for prime in &primes {
        writer.append(prime).expect("Append should succeed");
    }

    let content = fs::read_to_string(&path).expect("Output should exist");
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines[0], "existing");
    assert_eq!(lines.len(), 4);
    for (line, prime) in lines[1..].iter().zip(&primes) {
        assert_eq!(*line, prime.to_string());
    }
}

#[test]
fn missing_output_directory_is_an_io_error() {
    let dir = TempDir::new().expect("Temp dir should be created");
    let writer = ResultWriter::new(dir.path().join("no/such/dir/Primes.txt"), OutputMode::Compact);

    let prime = num_bigint::BigUint::from(65_521u32);
    assert!(matches!(
        writer.append(&prime),
        Err(prime_search::Error::Io(_))
    ));
}
