use crate::{error::Error, tensor::Tensor, Float, Result};

/// Mean Dice over one-hot `[batch, channel, spatial...]` tensors.
///
/// Values above 0.5 count as foreground. A (batch, channel) pair whose
/// ground truth is empty is skipped; `None` means every pair was skipped.
pub fn mean_dice(pred: &Tensor, label: &Tensor, include_background: bool) -> Result<Option<Float>> {
    if pred.shape() != label.shape() {
        return Err(Error::invalid(format!(
            "prediction shape {:?} differs from label shape {:?}",
            pred.shape(),
            label.shape()
        )));
    }
    if pred.rank() < 2 {
        return Err(Error::invalid(format!(
            "expected [batch, channel, ...], got shape {:?}",
            pred.shape()
        )));
    }

    let batch = pred.shape()[0];
    let channels = pred.shape()[1];
    let spatial: usize = pred.shape()[2..].iter().product();
    let first_channel = if include_background { 0 } else { 1 };

    let mut total = 0.0;
    let mut counted = 0;
    for b in 0..batch {
        for c in first_channel..channels {
            let start = (b * channels + c) * spatial;
            let range = start..start + spatial;

            let mut intersection = 0usize;
            let mut pred_count = 0usize;
            let mut label_count = 0usize;
            for (p, l) in pred.data[range.clone()].iter().zip(&label.data[range]) {
                let p = *p > 0.5;
                let l = *l > 0.5;
                intersection += usize::from(p && l);
                pred_count += usize::from(p);
                label_count += usize::from(l);
            }

            if label_count == 0 {
                continue;
            }
            total += 2.0 * intersection as Float / (pred_count + label_count) as Float;
            counted += 1;
        }
    }

    Ok((counted > 0).then(|| total / counted as Float))
}
