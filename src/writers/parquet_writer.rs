use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use arrow::array::*;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, GzipLevel, ZstdLevel};
use parquet::file::properties::WriterProperties;
use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::models::FeatureRow;
use crate::utils::constants::*;

pub struct ParquetWriter {
    compression: Compression,
    row_group_size: usize,
}

impl ParquetWriter {
    pub fn new() -> Self {
        Self {
            compression: Compression::SNAPPY,
            row_group_size: DEFAULT_ROW_GROUP_SIZE,
        }
    }

    pub fn with_compression(mut self, compression: &str) -> Result<Self> {
        self.compression = match compression.to_lowercase().as_str() {
            COMPRESSION_SNAPPY => Compression::SNAPPY,
            COMPRESSION_GZIP => Compression::GZIP(GzipLevel::default()),
            COMPRESSION_LZ4 => Compression::LZ4,
            COMPRESSION_ZSTD => Compression::ZSTD(ZstdLevel::default()),
            COMPRESSION_NONE => Compression::UNCOMPRESSED,
            _ => {
                return Err(PipelineError::Config(format!(
                    "Unsupported compression: {}",
                    compression
                )))
            }
        };
        Ok(self)
    }

    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size;
        self
    }

    /// Encode feature rows as a complete Parquet file in memory.
    pub fn write_rows(&self, rows: &[FeatureRow]) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.write_rows_to(rows, &mut buffer)?;
        Ok(buffer)
    }

    /// Write feature rows to any sink. An empty slice still produces a file carrying the schema.
    pub fn write_rows_to<W: Write + Send>(&self, rows: &[FeatureRow], sink: W) -> Result<()> {
        let schema = feature_schema();
        let props = WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size)
            .build();

        let mut writer = ArrowWriter::try_new(sink, schema.clone(), Some(props))?;
        for chunk in rows.chunks(self.row_group_size.max(1)) {
            let batch = rows_to_batch(chunk, schema.clone())?;
            writer.write(&batch)?;
        }
        writer.close()?;

        debug!("Encoded {} feature rows as Parquet", rows.len());
        Ok(())
    }

    /// Read up to `limit` feature rows back from a Parquet file.
    pub fn read_sample_rows(&self, path: &Path, limit: usize) -> Result<Vec<FeatureRow>> {
        use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

        let file = File::open(path)?;
        let parquet_reader = ParquetRecordBatchReaderBuilder::try_new(file)?
            .with_batch_size(limit.clamp(1, 8192))
            .build()?;

        let mut rows = Vec::new();
        for batch_result in parquet_reader {
            if rows.len() >= limit {
                break;
            }
            let batch = batch_result?;
            let take = batch.num_rows().min(limit - rows.len());
            rows.extend(batch_to_rows(&batch, take)?);
        }

        Ok(rows)
    }

    /// Get file statistics
    pub fn get_file_info(&self, path: &Path) -> Result<ParquetFileInfo> {
        use parquet::file::reader::{FileReader, SerializedFileReader};

        let file = File::open(path)?;
        let reader = SerializedFileReader::new(file)?;
        let metadata = reader.metadata();

        let row_groups = metadata.num_row_groups();
        let total_rows = metadata.file_metadata().num_rows();
        let file_size = std::fs::metadata(path)?.len();

        let row_group_sizes: Vec<i64> = metadata
            .row_groups()
            .iter()
            .map(|rg| rg.num_rows())
            .collect();
        let compression = metadata
            .row_groups()
            .first()
            .and_then(|rg| rg.columns().first())
            .map(|column| column.compression())
            .unwrap_or(self.compression);

        let columns = metadata
            .file_metadata()
            .schema_descr()
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();

        Ok(ParquetFileInfo {
            total_rows,
            row_groups: row_groups as i32,
            row_group_sizes,
            file_size,
            compression,
            columns,
        })
    }
}

impl Default for ParquetWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Arrow schema of the feature table; postal code, confidence and type may be null.
pub fn feature_schema() -> Arc<Schema> {
    let fields = vec![
        Field::new("town", DataType::Utf8, false),
        Field::new("block", DataType::Utf8, false),
        Field::new("street_name", DataType::Utf8, false),
        Field::new("storey_median", DataType::Int64, false),
        Field::new("floor_area_sqm", DataType::Float64, false),
        Field::new("room_no", DataType::Int64, false),
        Field::new("flat_model", DataType::Utf8, false),
        Field::new("lease_commence_date", DataType::Int64, false),
        Field::new("remaining_lease_in_months", DataType::Int64, false),
        Field::new("resale_price", DataType::Float64, false),
        Field::new("latitude", DataType::Float64, false),
        Field::new("longitude", DataType::Float64, false),
        Field::new("postal_code", DataType::Utf8, true),
        Field::new("confidence", DataType::Float64, true),
        Field::new("type", DataType::Utf8, true),
        Field::new("closest_mrt", DataType::Utf8, false),
        Field::new("distance_to_closest_mrt", DataType::Float64, false),
        Field::new("closest_mall", DataType::Utf8, false),
        Field::new("distance_to_closest_mall", DataType::Float64, false),
        Field::new("cbd", DataType::Utf8, false),
        Field::new("distance_to_cbd", DataType::Float64, false),
    ];

    Arc::new(Schema::new(fields))
}

fn strings(rows: &[FeatureRow], field: impl Fn(&FeatureRow) -> &str) -> ArrayRef {
    Arc::new(StringArray::from(rows.iter().map(|r| field(r)).collect::<Vec<&str>>()))
}

fn ints(rows: &[FeatureRow], field: impl Fn(&FeatureRow) -> i64) -> ArrayRef {
    Arc::new(Int64Array::from(rows.iter().map(field).collect::<Vec<i64>>()))
}

fn floats(rows: &[FeatureRow], field: impl Fn(&FeatureRow) -> f64) -> ArrayRef {
    Arc::new(Float64Array::from(rows.iter().map(field).collect::<Vec<f64>>()))
}

fn rows_to_batch(rows: &[FeatureRow], schema: Arc<Schema>) -> Result<RecordBatch> {
    let postal_codes: Vec<Option<&str>> = rows.iter().map(|r| r.postal_code.as_deref()).collect();
    let confidences: Vec<Option<f64>> = rows.iter().map(|r| r.confidence).collect();
    let types: Vec<Option<&str>> = rows.iter().map(|r| r.address_type.as_deref()).collect();

    let batch = RecordBatch::try_new(
        schema,
        vec![
            strings(rows, |r| r.town.as_str()),
            strings(rows, |r| r.block.as_str()),
            strings(rows, |r| r.street_name.as_str()),
            ints(rows, |r| r.storey_median),
            floats(rows, |r| r.floor_area_sqm),
            ints(rows, |r| r.room_no),
            strings(rows, |r| r.flat_model.as_str()),
            ints(rows, |r| r.lease_commence_date),
            ints(rows, |r| r.remaining_lease_in_months),
            floats(rows, |r| r.resale_price),
            floats(rows, |r| r.latitude),
            floats(rows, |r| r.longitude),
            Arc::new(StringArray::from(postal_codes)),
            Arc::new(Float64Array::from(confidences)),
            Arc::new(StringArray::from(types)),
            strings(rows, |r| r.closest_mrt.as_str()),
            floats(rows, |r| r.distance_to_closest_mrt),
            strings(rows, |r| r.closest_mall.as_str()),
            floats(rows, |r| r.distance_to_closest_mall),
            strings(rows, |r| r.cbd.as_str()),
            floats(rows, |r| r.distance_to_cbd),
        ],
    )?;

    Ok(batch)
}

fn column<'a, T: Array + 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a T> {
    let index = batch.schema().index_of(name)?;
    batch
        .column(index)
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| PipelineError::InvalidFormat(format!("Invalid {} column type", name)))
}

fn optional_string(array: &StringArray, i: usize) -> Option<String> {
    (!array.is_null(i)).then(|| array.value(i).to_string())
}

fn batch_to_rows(batch: &RecordBatch, take: usize) -> Result<Vec<FeatureRow>> {
    let town = column::<StringArray>(batch, "town")?;
    let block = column::<StringArray>(batch, "block")?;
    let street_name = column::<StringArray>(batch, "street_name")?;
    let storey_median = column::<Int64Array>(batch, "storey_median")?;
    let floor_area_sqm = column::<Float64Array>(batch, "floor_area_sqm")?;
    let room_no = column::<Int64Array>(batch, "room_no")?;
    let flat_model = column::<StringArray>(batch, "flat_model")?;
    let lease_commence_date = column::<Int64Array>(batch, "lease_commence_date")?;
    let remaining_lease = column::<Int64Array>(batch, "remaining_lease_in_months")?;
    let resale_price = column::<Float64Array>(batch, "resale_price")?;
    let latitude = column::<Float64Array>(batch, "latitude")?;
    let longitude = column::<Float64Array>(batch, "longitude")?;
    let postal_code = column::<StringArray>(batch, "postal_code")?;
    let confidence = column::<Float64Array>(batch, "confidence")?;
    let address_type = column::<StringArray>(batch, "type")?;
    let closest_mrt = column::<StringArray>(batch, "closest_mrt")?;
    let distance_to_closest_mrt = column::<Float64Array>(batch, "distance_to_closest_mrt")?;
    let closest_mall = column::<StringArray>(batch, "closest_mall")?;
    let distance_to_closest_mall = column::<Float64Array>(batch, "distance_to_closest_mall")?;
    let cbd = column::<StringArray>(batch, "cbd")?;
    let distance_to_cbd = column::<Float64Array>(batch, "distance_to_cbd")?;

    let rows = (0..take)
        .map(|i| FeatureRow {
            town: town.value(i).to_string(),
            block: block.value(i).to_string(),
            street_name: street_name.value(i).to_string(),
            storey_median: storey_median.value(i),
            floor_area_sqm: floor_area_sqm.value(i),
            room_no: room_no.value(i),
            flat_model: flat_model.value(i).to_string(),
            lease_commence_date: lease_commence_date.value(i),
            remaining_lease_in_months: remaining_lease.value(i),
            resale_price: resale_price.value(i),
            latitude: latitude.value(i),
            longitude: longitude.value(i),
            postal_code: optional_string(postal_code, i),
            confidence: (!confidence.is_null(i)).then(|| confidence.value(i)),
            address_type: optional_string(address_type, i),
            closest_mrt: closest_mrt.value(i).to_string(),
            distance_to_closest_mrt: distance_to_closest_mrt.value(i),
            closest_mall: closest_mall.value(i).to_string(),
            distance_to_closest_mall: distance_to_closest_mall.value(i),
            cbd: cbd.value(i).to_string(),
            distance_to_cbd: distance_to_cbd.value(i),
        })
        .collect();

    Ok(rows)
}

#[derive(Debug)]
pub struct ParquetFileInfo {
    pub total_rows: i64,
    pub row_groups: i32,
    pub row_group_sizes: Vec<i64>,
    pub file_size: u64,
    pub compression: Compression,
    pub columns: Vec<String>,
}

impl ParquetFileInfo {
    pub fn summary(&self) -> String {
        let avg_rows = if self.row_groups > 0 {
            self.total_rows as f64 / self.row_groups as f64
        } else {
            0.0
        };

        format!(
            "Parquet File Summary:\n\
            - Total rows: {}\n\
            - Row groups: {}\n\
            - File size: {:.2} MB\n\
            - Compression: {:?}\n\
            - Avg rows per group: {:.0}\n\
            - Columns: {}",
            self.total_rows,
            self.row_groups,
            self.file_size as f64 / 1_048_576.0,
            self.compression,
            avg_rows,
            self.columns.join(", ")
        )
    }
}
