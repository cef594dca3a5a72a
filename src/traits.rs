use crate::errors::Result;
use ndarray::{Array2, ArrayView3};

/// セグメンテーションモデルの抽象化
///
/// 推論バックエンドの詳細を隠蔽し、モックによるテストを可能にする
pub trait SpillSegmentationModel: Send + Sync {
    /// モデルの入力キャンバスサイズを取得
    fn canvas_size(&self) -> u32;

    /// `(3, S, S)` テンソルから `(S, S)` の確率場を推論
    ///
    /// 返される値は [0,1] の確率（活性化適用済み）でなければならない
    fn infer(&self, tensor: ArrayView3<'_, f32>) -> Result<Array2<f32>>;
}
