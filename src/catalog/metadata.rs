//! Table metadata records.

use crate::common::bytes::{ByteReader, ByteWriter};
use crate::common::{Error, Result};

/// Column value type.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Int = 0,
    Char = 1,
}

impl DataType {
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            0 => Ok(DataType::Int),
            1 => Ok(DataType::Char),
            other => Err(Error::UnknownDataType(other)),
        }
    }
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexType {
    /// The index the table's rows are stored in.
    Clustered = 0,
    Secondary = 1,
}

impl IndexType {
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            0 => Ok(IndexType::Clustered),
            1 => Ok(IndexType::Secondary),
            other => Err(Error::UnknownIndexType(other)),
        }
    }
}

/// One column of a table.
///
/// # Layout
/// ```text
/// Size     Field
/// 1 + n    name (u8 length + UTF-8)
/// 1        data_type
/// 1        nullable (0 or 1)
/// 2        length (i16)
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    name: String,
    data_type: DataType,
    nullable: bool,
    length: u16,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: DataType, nullable: bool, length: u16) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable,
            length,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn length(&self) -> u16 {
        self.length
    }

    pub fn byte_size(&self) -> usize {
        1 + self.name.len() + 1 + 1 + 2
    }

    fn read_from(reader: &mut ByteReader<'_>) -> Result<Self> {
        let name = reader.read_short_string()?;
        let data_type = DataType::from_u8(reader.read_u8()?)?;
        let nullable = reader.read_u8()? == 1;
        let length = reader.read_u16()?;
        Ok(Self::new(name, data_type, nullable, length))
    }

    fn write_to(&self, writer: &mut ByteWriter<'_>) {
        writer.write_short_string(&self.name);
        writer.write_u8(self.data_type as u8);
        writer.write_u8(self.nullable as u8);
        writer.write_u16(self.length);
    }
}

/// One index of a table and the page its tree starts at.
///
/// # Layout
/// ```text
/// Size     Field
/// 1 + n    name (u8 length + UTF-8)
/// 1        index_type
/// 4        root_page_number (i32)
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    name: String,
    index_type: IndexType,
    root_page_number: u32,
}

impl Index {
    pub fn new(name: impl Into<String>, index_type: IndexType, root_page_number: u32) -> Self {
        Self {
            name: name.into(),
            index_type,
            root_page_number,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn index_type(&self) -> IndexType {
        self.index_type
    }

    pub fn is_clustered(&self) -> bool {
        self.index_type == IndexType::Clustered
    }

    pub fn root_page_number(&self) -> u32 {
        self.root_page_number
    }

    pub fn byte_size(&self) -> usize {
        1 + self.name.len() + 1 + 4
    }

    fn read_from(reader: &mut ByteReader<'_>) -> Result<Self> {
        let name = reader.read_short_string()?;
        let index_type = IndexType::from_u8(reader.read_u8()?)?;
        let root_page_number = reader.read_u32()?;
        Ok(Self::new(name, index_type, root_page_number))
    }

    fn write_to(&self, writer: &mut ByteWriter<'_>) {
        writer.write_short_string(&self.name);
        writer.write_u8(self.index_type as u8);
        writer.write_u32(self.root_page_number);
    }
}

/// Definition of one table: its columns and its indexes.
///
/// The storage core only consumes it to find the clustered index root.
///
/// # Layout
/// ```text
/// Size     Field
/// 8        table_id (u64)
/// 1 + n    table_name (u8 length + UTF-8)
/// 1        column count
/// ...      columns
/// 1        index count
/// ...      indexes
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    table_id: u64,
    table_name: String,
    columns: Vec<Column>,
    indexes: Vec<Index>,
}

impl Metadata {
    /// # Errors
    /// `Error::InvalidConfig` if a name is longer than 255 bytes or there
    /// are more than 255 columns or indexes.
    pub fn new(
        table_id: u64,
        table_name: impl Into<String>,
        columns: Vec<Column>,
        indexes: Vec<Index>,
    ) -> Result<Self> {
        let table_name = table_name.into();
        let too_long = std::iter::once(table_name.as_str())
            .chain(columns.iter().map(Column::name))
            .chain(indexes.iter().map(Index::name))
            .find(|name| name.len() > u8::MAX as usize);
        if let Some(name) = too_long {
            return Err(Error::InvalidConfig(format!(
                "name longer than 255 bytes: {}...",
                &name[..name.char_indices().nth(16).map_or(name.len(), |(i, _)| i)]
            )));
        }
        if columns.len() > u8::MAX as usize || indexes.len() > u8::MAX as usize {
            return Err(Error::InvalidConfig(format!(
                "table {} has {} columns and {} indexes, at most 255 each",
                table_name,
                columns.len(),
                indexes.len()
            )));
        }

        Ok(Self {
            table_id,
            table_name,
            columns,
            indexes,
        })
    }

    /// # Errors
    /// `Error::NotFound` if the table has no clustered index.
    pub fn clustered_index(&self) -> Result<&Index> {
        self.indexes
            .iter()
            .find(|index| index.is_clustered())
            .ok_or_else(|| Error::NotFound(format!("clustered index of {}", self.table_name)))
    }

    pub fn index(&self, name: &str) -> Result<&Index> {
        self.indexes
            .iter()
            .find(|index| index.name() == name)
            .ok_or_else(|| Error::NotFound(format!("index {}", name)))
    }

    pub fn column(&self, name: &str) -> Result<&Column> {
        self.columns
            .iter()
            .find(|column| column.name() == name)
            .ok_or_else(|| Error::NotFound(format!("column {}", name)))
    }

    pub fn table_id(&self) -> u64 {
        self.table_id
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn indexes(&self) -> &[Index] {
        &self.indexes
    }

    /// Serialized size in bytes.
    pub fn byte_size(&self) -> usize {
        8 + (1 + self.table_name.len())
            + (1 + self.columns.iter().map(Column::byte_size).sum::<usize>())
            + (1 + self.indexes.iter().map(Index::byte_size).sum::<usize>())
    }

    pub fn read_from(reader: &mut ByteReader<'_>) -> Result<Self> {
        let table_id = reader.read_u64()?;
        let table_name = reader.read_short_string()?;

        let column_count = reader.read_u8()?;
        let columns = (0..column_count)
            .map(|_| Column::read_from(reader))
            .collect::<Result<Vec<_>>>()?;

        let index_count = reader.read_u8()?;
        let indexes = (0..index_count)
            .map(|_| Index::read_from(reader))
            .collect::<Result<Vec<_>>>()?;

        Self::new(table_id, table_name, columns, indexes)
    }

    pub fn write_to(&self, writer: &mut ByteWriter<'_>) {
        writer.write_u64(self.table_id);
        writer.write_short_string(&self.table_name);
        writer.write_u8(self.columns.len() as u8);
        for column in &self.columns {
            column.write_to(writer);
        }
        writer.write_u8(self.indexes.len() as u8);
        for index in &self.indexes {
            index.write_to(writer);
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = vec![0u8; self.byte_size()];
        self.write_to(&mut ByteWriter::new(&mut buf));
        buf
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::read_from(&mut ByteReader::new(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Metadata {
        Metadata::new(
            7,
            "jazz",
            vec![
                Column::new("id", DataType::Int, false, 4),
                Column::new("title", DataType::Char, true, 64),
            ],
            vec![
                Index::new("PRIMARY", IndexType::Clustered, 3),
                Index::new("by_title", IndexType::Secondary, 9),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_lookups() {
        let metadata = sample();
        assert_eq!(metadata.clustered_index().unwrap().root_page_number(), 3);
        assert_eq!(metadata.index("by_title").unwrap().index_type(), IndexType::Secondary);
        assert!(metadata.column("title").unwrap().is_nullable());
        assert_eq!(metadata.column("id").unwrap().data_type(), DataType::Int);
    }

    #[test]
    fn test_missing_lookups() {
        let metadata = sample();
        assert!(matches!(metadata.index("nope"), Err(Error::NotFound(_))));
        assert!(matches!(metadata.column("nope"), Err(Error::NotFound(_))));

        let heap = Metadata::new(1, "heap", vec![], vec![]).unwrap();
        assert!(matches!(heap.clustered_index(), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_metadata_roundtrip() {
        let metadata = sample();
        let bytes = metadata.to_bytes();
        assert_eq!(bytes.len(), metadata.byte_size());
        assert_eq!(Metadata::from_bytes(&bytes).unwrap(), metadata);
    }

    #[test]
    fn test_byte_size() {
        // 8 + (1+4) + (1 + (1+2+4) + (1+5+4)) + (1 + (1+7+5) + (1+8+5))
        assert_eq!(sample().byte_size(), 8 + 5 + 18 + 28);
    }

    #[test]
    fn test_unknown_codes() {
        let mut bytes = sample().to_bytes();
        // data_type of the first column: after id(8), name(5), count(1), "id"(3)
        bytes[17] = 9;
        assert!(matches!(Metadata::from_bytes(&bytes), Err(Error::UnknownDataType(9))));

        assert!(matches!(IndexType::from_u8(2), Err(Error::UnknownIndexType(2))));
    }

    #[test]
    fn test_truncated_record() {
        let bytes = sample().to_bytes();
        let result = Metadata::from_bytes(&bytes[..bytes.len() - 1]);
        assert!(matches!(result, Err(Error::Corrupted(_))));
    }

    #[test]
    fn test_rejects_long_names() {
        let name = "x".repeat(256);
        let result = Metadata::new(1, name, vec![], vec![]);
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }
}
