use candle_core::{DType, Device, Tensor};
use docqa_embed::masked_mean_l2;

fn rows(t: &Tensor) -> Vec<Vec<f32>> { t.to_vec2().expect("to_vec2") }

#[test]
fn padding_tokens_do_not_shift_the_mean() {
    let dev = Device::Cpu;
    // batch 2, 3 tokens, hidden 2; the second sequence has one padding token.
    let hidden = Tensor::from_slice(
        &[3.0f32, 4.0, 3.0, 4.0, 100.0, -100.0, 0.0, 2.0, 0.0, 4.0, 50.0, 50.0],
        (2, 3, 2),
        &dev,
    )
    .expect("hidden");
    let mask = Tensor::from_slice(&[1u32, 1, 0, 1, 1, 0], (2, 3), &dev).expect("mask");

    let pooled = rows(&masked_mean_l2(&hidden, &mask).expect("pool"));
    assert_eq!(pooled.len(), 2);
    // mean [3,4] -> unit [0.6, 0.8]; mean [0,3] -> unit [0, 1]
    let expected = [[0.6f32, 0.8], [0.0, 1.0]];
    for (got, want) in pooled.iter().zip(expected) {
        for (a, b) in got.iter().zip(want) {
            assert!((a - b).abs() < 1e-5, "got {got:?}, want {want:?}");
        }
    }
}

#[test]
fn pooled_rows_are_unit_length() {
    let dev = Device::Cpu;
    let hidden = Tensor::arange(1f32, 25f32, &dev).expect("arange").reshape((2, 4, 3)).expect("reshape");
    let mask = Tensor::ones((2, 4), DType::F32, &dev).expect("mask");
    for row in rows(&masked_mean_l2(&hidden, &mask).expect("pool")) {
        let norm: f32 = row.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5, "norm {norm}");
    }
}

#[test]
fn masked_mean_l2_rejects_rank_two() {
    let dev = Device::Cpu;
    let h = Tensor::zeros((2, 4), DType::F32, &dev).expect("hidden");
    let mask = Tensor::ones((2, 1), DType::F32, &dev).expect("mask");
    assert!(masked_mean_l2(&h, &mask).is_err());
}
