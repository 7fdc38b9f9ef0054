//! End-to-end mixing runs over synthetic input files.
//!
//! Each test writes real WAV inputs, runs the engine the way the CLI does,
//! and checks the mixed samples read back from the output file.

use blockmix_cli::{MixEngine, MixPlan, Pipeline, Profiler};
use blockmix_mixer::{GainPair, Strategy};
use blockmix_tests::{
    expected_float_sample, expected_int16_sample, read_pcm16, write_pcm16, MixFixture,
};
use blockmix_wav::{compute_pcm_hash, FormatDescriptor, WavReader};
use pretty_assertions::assert_eq;

fn gains() -> Vec<GainPair> {
    vec![
        GainPair::new(0.5, 0.5),
        GainPair::new(0.3, 0.5),
        GainPair::new(0.5, 0.3),
    ]
}

fn run(plan: MixPlan) -> blockmix_cli::MixSummary {
    MixEngine::open(plan)
        .expect("open engine")
        .run(&Profiler::disabled())
        .expect("run mix")
}

#[test]
fn float_pipeline_matches_scalar_model_for_every_strategy() {
    let fixture = MixFixture::stereo(&gains(), 640);

    for strategy in Strategy::ALL {
        let summary = run(fixture.plan(128, Some(5), strategy));
        assert_eq!(summary.blocks, 5);
        assert_eq!(summary.samples_written, 640);

        let mixed = read_pcm16(&fixture.output_path());
        assert_eq!(mixed.len(), 640);
        for (i, &sample) in mixed.iter().enumerate() {
            let expected = expected_float_sample(&fixture.contributions(i));
            // Fused multiply-add in the wide kernels can move a sample across
            // a truncation boundary.
            assert!(
                (i32::from(sample) - i32::from(expected)).abs() <= 1,
                "{strategy}: sample {i} is {sample}, expected {expected}"
            );
        }
    }
}

#[test]
fn int16_pipeline_matches_integer_model() {
    let fixture = MixFixture::stereo(&gains(), 512);
    let mut plan = fixture.plan(64, None, Strategy::Scalar);
    plan.pipeline = Pipeline::Int16;

    let summary = run(plan);
    assert_eq!(summary.pipeline, Pipeline::Int16);
    assert_eq!(summary.blocks, 8);

    let mixed = read_pcm16(&fixture.output_path());
    let expected: Vec<i16> = (0..512)
        .map(|i| expected_int16_sample(&fixture.contributions(i)))
        .collect();
    assert_eq!(mixed, expected);
}

#[test]
fn int16_pipeline_ignores_strategy() {
    let fixture = MixFixture::stereo(&gains(), 256);
    let mut hashes = Vec::new();
    for strategy in Strategy::ALL {
        let mut plan = fixture.plan(64, None, strategy);
        plan.pipeline = Pipeline::Int16;
        hashes.push(run(plan).pcm_hash);
    }
    assert!(hashes.windows(2).all(|w| w[0] == w[1]));
}

#[test]
fn two_stream_scenario_produces_known_samples() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("a.wav");
    let second = dir.path().join("b.wav");
    write_pcm16(&first, 2, 48000, &[16384, 16384]);
    write_pcm16(&second, 2, 48000, &[8192, 8192]);

    let plan = MixPlan::from_json_str(&format!(
        r#"{{
            "inputs": [
                {{"path": {first:?}, "gain": {{"left": 0.5, "right": 0.5}}}},
                {{"path": {second:?}, "gain": {{"left": 0.3, "right": 0.5}}}}
            ],
            "output": {{"path": {out:?}}},
            "block_size": 2
        }}"#,
        first = first.to_string_lossy(),
        second = second.to_string_lossy(),
        out = dir.path().join("out.wav").to_string_lossy(),
    ))
    .unwrap();

    let mut float_plan = plan.clone();
    float_plan.strategy = Strategy::Scalar;
    run(float_plan);
    assert_eq!(read_pcm16(&dir.path().join("out.wav")), vec![10649, 12288]);

    let mut int_plan = plan;
    int_plan.pipeline = Pipeline::Int16;
    run(int_plan);
    assert_eq!(read_pcm16(&dir.path().join("out.wav")), vec![10649, 12288]);
}

#[test]
fn automatic_block_count_follows_shortest_input() {
    let dir = tempfile::tempdir().unwrap();
    let long = dir.path().join("long.wav");
    let short = dir.path().join("short.wav");
    write_pcm16(&long, 2, 48000, &vec![100; 300]);
    write_pcm16(&short, 2, 48000, &vec![100; 200]);

    let mut plan = MixPlan::from_json_str(r#"{"inputs": [{"path": "long.wav"}, {"path": "short.wav"}]}"#)
        .unwrap();
    plan.output.path = "out.wav".into();
    plan.block_size = 64;
    plan.resolve_paths(dir.path());

    let summary = run(plan);
    assert_eq!(summary.blocks, 3);
    assert_eq!(summary.samples_written, 192);
    assert_eq!(read_pcm16(&dir.path().join("out.wav")), vec![200; 192]);
}

#[test]
fn output_header_describes_written_data() {
    let fixture = MixFixture::stereo(&gains(), 256);
    run(fixture.plan(64, Some(4), Strategy::Simd256));

    let reader = WavReader::open(fixture.output_path()).unwrap();
    assert_eq!(*reader.format(), FormatDescriptor::stereo16(48000));
    assert_eq!(reader.total_samples(), 256);
    assert_eq!(reader.data_size(), 512);
    assert_eq!(reader.data_offset(), 46);

    let on_disk = std::fs::metadata(fixture.output_path()).unwrap().len();
    assert_eq!(on_disk, 46 + 512);
}

#[test]
fn hound_reads_mixed_output() {
    let fixture = MixFixture::stereo(&gains(), 128);
    run(fixture.plan(32, None, Strategy::Simd128));

    let mut reader = hound::WavReader::open(fixture.output_path()).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.channels, 2);
    assert_eq!(spec.sample_rate, 48000);
    assert_eq!(spec.bits_per_sample, 16);
    let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
    assert_eq!(samples, read_pcm16(&fixture.output_path()));
}

#[test]
fn summary_hash_matches_output_file() {
    let fixture = MixFixture::stereo(&gains(), 256);
    let summary = run(fixture.plan(64, None, Strategy::Simd512));

    assert_eq!(summary.inputs, 3);
    assert_eq!(summary.strategy, Strategy::Simd512);
    assert_eq!(summary.output, fixture.output_path());
    assert_eq!(summary.pcm_hash, compute_pcm_hash(fixture.output_path()).unwrap());
    assert_eq!(summary.pcm_hash.len(), 64);
}

#[test]
fn profiler_records_every_scope() {
    let fixture = MixFixture::stereo(&gains(), 256);
    let profiler = Profiler::new();
    MixEngine::open(fixture.plan(64, Some(4), Strategy::Simd256))
        .unwrap()
        .run(&profiler)
        .unwrap();

    let report = profiler.report();
    let count = |label: &str| {
        report
            .iter()
            .find(|entry| entry.label == label)
            .map(|entry| entry.count)
            .unwrap_or(0)
    };
    assert_eq!(count("run"), 1);
    assert_eq!(count("block"), 4);
    assert_eq!(count("read"), 12);
    assert_eq!(count("mix"), 12);
    assert_eq!(count("write"), 4);
}

#[test]
fn mono_output_uses_left_gain() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("mono.wav");
    write_pcm16(&input, 1, 48000, &[1000, 2000, -1000, -2000]);

    let mut plan = MixPlan::from_json_str(
        r#"{"inputs": [{"path": "mono.wav", "gain": {"left": 0.5, "right": 0.0}}],
            "output": {"path": "out.wav", "channels": 1},
            "block_size": 4}"#,
    )
    .unwrap();
    plan.resolve_paths(dir.path());
    plan.pipeline = Pipeline::Int16;
    run(plan);

    assert_eq!(read_pcm16(&dir.path().join("out.wav")), vec![500, 1000, -500, -1000]);
}

#[test]
fn float_pipeline_accepts_24_bit_inputs() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("hi.wav");
    // 0.5 and -0.25 of full scale.
    blockmix_tests::write_pcm24(&input, 48000, &[4_194_304, -2_097_152]);

    let mut plan = MixPlan::from_json_str(r#"{"inputs": [{"path": "hi.wav"}], "block_size": 2}"#)
        .unwrap();
    plan.output.path = "out.wav".into();
    plan.resolve_paths(dir.path());
    run(plan);

    assert_eq!(read_pcm16(&dir.path().join("out.wav")), vec![16384, -8192]);
}
