//! Fusion of text and frame embeddings into one video vector.

use crate::error::{Result, VidmindError};

/// Element-wise mean of the text vector and every frame vector.
///
/// All inputs count equally. With no frames the text vector is returned unchanged. The
/// result is not renormalized, so its magnitude may be below one.
pub fn fuse_embeddings(text: &[f32], frames: &[Vec<f32>]) -> Result<Vec<f32>> {
    if let Some((i, bad)) = frames.iter().enumerate().find(|(_, f)| f.len() != text.len()) {
        return Err(VidmindError::Embedding(format!(
            "Frame {} has {} dimensions, text has {}",
            i,
            bad.len(),
            text.len()
        )));
    }

    if frames.is_empty() {
        return Ok(text.to_vec());
    }

    let mut sum: Vec<f32> = text.to_vec();
    for frame in frames {
        for (acc, x) in sum.iter_mut().zip(frame) {
            *acc += x;
        }
    }

    let count = (frames.len() + 1) as f32;
    Ok(sum.into_iter().map(|x| x / count).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_frames_returns_text_vector() {
        let text = vec![0.6, 0.8, 0.0];
        assert_eq!(fuse_embeddings(&text, &[]).unwrap(), text);
    }

    #[test]
    fn test_mean_of_all_inputs() {
        let text = vec![1.0, 0.0];
        let frames = vec![vec![0.0, 1.0], vec![0.5, 0.5]];
        let fused = fuse_embeddings(&text, &frames).unwrap();
        assert!((fused[0] - 0.5).abs() < 1e-6);
        assert!((fused[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_dimension_preserved() {
        let text = vec![0.1; 512];
        let frames = vec![vec![0.2; 512]; 7];
        assert_eq!(fuse_embeddings(&text, &frames).unwrap().len(), 512);
    }

    #[test]
    fn test_result_is_not_renormalized() {
        let fused = fuse_embeddings(&[1.0, 0.0], &[vec![0.0, 1.0]]).unwrap();
        let norm: f32 = fused.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!(norm < 1.0);
    }

    #[test]
    fn test_mismatched_dimensions_rejected() {
        let result = fuse_embeddings(&[1.0, 0.0], &[vec![1.0]]);
        assert!(matches!(result, Err(VidmindError::Embedding(_))));
    }
}
