use crate::errors::Result;
use crate::traits::SpillSegmentationModel;
use ndarray::{Array2, ArrayView3};

/// テスト用のモックセグメンテーションモデル
///
/// 一様な確率場を返す
#[derive(Debug, Clone)]
pub struct MockSpillModel {
    pub canvas_size: u32,
    pub probability: f32,
}

impl MockSpillModel {
    pub const fn new(canvas_size: u32, probability: f32) -> Self {
        Self {
            canvas_size,
            probability,
        }
    }
}

impl SpillSegmentationModel for MockSpillModel {
    fn canvas_size(&self) -> u32 {
        self.canvas_size
    }

    fn infer(&self, _tensor: ArrayView3<'_, f32>) -> Result<Array2<f32>> {
        // テスト用の簡易実装：定数確率場を返す
        let size = self.canvas_size as usize;
        Ok(Array2::from_elem((size, size), self.probability))
    }
}

/// 固定の確率場をそのまま返すモック
#[derive(Debug, Clone)]
pub struct FieldMockModel {
    field: Array2<f32>,
}

impl FieldMockModel {
    /// 確率場は正方形（キャンバス解像度）でなければならない
    pub fn new(field: Array2<f32>) -> Self {
        assert_eq!(field.nrows(), field.ncols());
        Self { field }
    }
}

impl SpillSegmentationModel for FieldMockModel {
    fn canvas_size(&self) -> u32 {
        self.field.nrows() as u32
    }

    fn infer(&self, _tensor: ArrayView3<'_, f32>) -> Result<Array2<f32>> {
        Ok(self.field.clone())
    }
}

/// 出力形状が契約と一致しないモデル（エラーパス検証用）
#[derive(Debug, Clone)]
pub struct MisshapenMockModel {
    pub canvas_size: u32,
}

impl SpillSegmentationModel for MisshapenMockModel {
    fn canvas_size(&self) -> u32 {
        self.canvas_size
    }

    fn infer(&self, _tensor: ArrayView3<'_, f32>) -> Result<Array2<f32>> {
        // キャンバスサイズを無視した形状を返す
        Ok(Array2::zeros((1, 1)))
    }
}

/// テスト用のファクトリー関数
pub const fn create_mock_model() -> MockSpillModel {
    MockSpillModel::new(512, 0.0)
}
