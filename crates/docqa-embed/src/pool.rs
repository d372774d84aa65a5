//! Sentence pooling over encoder output.

use anyhow::{bail, Result};
use candle_core::{DType, Tensor, D};

/// Attention-masked mean over the token axis, then L2 normalisation.
///
/// `hidden` is `[batch, tokens, hidden]` and `attention_mask` is
/// `[batch, tokens]`; the result is `[batch, hidden]`.
pub fn masked_mean_l2(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    if hidden.rank() != 3 {
        bail!("hidden shape must be [B,T,H], got {:?}", hidden.dims());
    }
    let mask = attention_mask.to_device(hidden.device())?.to_dtype(hidden.dtype())?;
    let summed = hidden.broadcast_mul(&mask.unsqueeze(D::Minus1)?)?.sum(1)?;
    let mean = summed.broadcast_div(&mask.sum_keepdim(1)?)?;

    let eps = match hidden.dtype() { DType::F16 | DType::BF16 => 1e-6, _ => 1e-12 };
    let norm = (mean.sqr()?.sum_keepdim(1)?.sqrt()? + eps)?;
    Ok(mean.broadcast_div(&norm)?)
}
