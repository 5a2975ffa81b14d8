use crate::domain::model::{BatchResultSet, CodeRecord, LookupStatus, NotifyStatus};
use crate::utils::error::{BatchError, Result};
use serde::{Deserialize, Serialize};

/// 輸出資料集的一列
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetRow {
    pub input: String,
    pub cep: String,
    pub street: String,
    pub district: String,
    pub city: String,
    pub region: String,
    pub provider: String,
    pub lookup_status: LookupStatus,
    pub notify_status: NotifyStatus,
}

impl From<&CodeRecord> for DatasetRow {
    fn from(record: &CodeRecord) -> Self {
        let fields = record.fields.clone().unwrap_or_default();
        Self {
            input: record.input.clone(),
            cep: record.code.clone(),
            street: fields.street,
            district: fields.district,
            city: fields.city,
            region: fields.region,
            provider: record.provider.clone().unwrap_or_default(),
            lookup_status: record.lookup_status,
            notify_status: record.notify_status,
        }
    }
}

pub fn encode_dataset(batch: &BatchResultSet) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for record in batch.iter() {
        writer.serialize(DatasetRow::from(record))?;
    }
    writer.into_inner().map_err(|e| BatchError::PersistenceError {
        artifact: "dataset".to_string(),
        message: e.to_string(),
    })
}

/// 從輸入 CSV 取出指定欄位的 CEP，保持原順序
pub fn decode_input_codes(data: &[u8], code_field: &str, path: &str) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(data);

    // Excel 匯出的 CSV 可能帶有 BOM
    let position = reader
        .headers()?
        .iter()
        .position(|header| header.trim_start_matches('\u{feff}') == code_field)
        .ok_or_else(|| BatchError::MissingInputFieldError {
            path: path.to_string(),
            field: code_field.to_string(),
        })?;

    // 每一列都產生一筆記錄；空白或缺少的儲存格保留為空字串，查詢階段會記為失敗
    // (完全空白的行由 CSV reader 略過)
    let mut codes = Vec::new();
    for (line, row) in reader.records().enumerate() {
        let row = row?;
        let code = row.get(position).unwrap_or_default();
        if code.is_empty() {
            tracing::warn!("Row {} of {} has an empty {} value", line + 2, path, code_field);
        }
        codes.push(code.to_string());
    }

    Ok(codes)
}
