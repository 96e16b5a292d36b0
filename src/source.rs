// 📄 Record Source - raw SWIFT records for the one-time import
//
// The seed file is a CSV export of the SWIFT spreadsheet. Columns are read by
// position, the header row is skipped:
//
//   0 COUNTRY ISO2 CODE | 1 SWIFT CODE | 2 CODE TYPE | 3 NAME | 4 ADDRESS
//   5 TOWN NAME | 6 COUNTRY NAME | 7 TIME ZONE
//
// Every cell we keep is trimmed and uppercased here, not in the importer.
// The .xlsx workbook itself is not readable: export each sheet to CSV (one
// file, one header row) and point the seed path at that.

use crate::code::BankCode;
use crate::error::Result;
use std::io::Read;
use std::path::PathBuf;

const COL_COUNTRY_ISO2: usize = 0;
const COL_SWIFT_CODE: usize = 1;
const COL_BANK_NAME: usize = 3;
const COL_ADDRESS: usize = 4;
const COL_COUNTRY_NAME: usize = 6;

/// Anything that can produce a flat, unordered list of raw records
pub trait RecordSource {
    /// Records without identity and without headquarter reference
    fn read_records(&self) -> Result<Vec<BankCode>>;

    /// Human-readable origin, for logs
    fn describe(&self) -> String;
}

/// CSV file on disk
pub struct CsvRecordSource {
    path: PathBuf,
}

impl CsvRecordSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        CsvRecordSource { path: path.into() }
    }
}

impl RecordSource for CsvRecordSource {
    fn read_records(&self) -> Result<Vec<BankCode>> {
        let file = std::fs::File::open(&self.path)?;
        read_csv(file)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Parse records from any CSV reader
pub fn read_csv<R: Read>(input: R) -> Result<Vec<BankCode>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(input);

    let mut records = Vec::new();

    for result in rdr.records() {
        let row = result?;
        let cell = |index: usize| row.get(index).unwrap_or("");

        records.push(BankCode::new(
            cell(COL_SWIFT_CODE),
            cell(COL_BANK_NAME),
            cell(COL_ADDRESS),
            cell(COL_COUNTRY_ISO2),
            cell(COL_COUNTRY_NAME),
        ));
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = "\
COUNTRY ISO2 CODE,SWIFT CODE,CODE TYPE,NAME,ADDRESS,TOWN NAME,COUNTRY NAME,TIME ZONE
al,AAISALTRXXX,BIC11,United Bank of Albania Sh.A,\"HYRJA 3 RR. DRITAN HOXHA, TIRANA\",TIRANA,Albania,Europe/Tirane
BG, abiebgs1xxx ,BIC11,ABV Investments Ltd, Tsar Asen 20 ,VARNA,Bulgaria,Europe/Sofia
BG,ADCRBGS1XXX,BIC11,ADAMANT CAPITAL PARTNERS AD,,SOFIA,BULGARIA,Europe/Sofia
";

    #[test]
    fn test_read_csv_trims_and_uppercases() {
        let records = read_csv(SAMPLE.as_bytes()).unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].code, "AAISALTRXXX");
        assert_eq!(records[0].bank_name, "UNITED BANK OF ALBANIA SH.A");
        assert_eq!(records[0].address, "HYRJA 3 RR. DRITAN HOXHA, TIRANA");
        assert_eq!(records[0].country_iso2, "AL");
        assert_eq!(records[0].country_name, "ALBANIA");

        assert_eq!(records[1].code, "ABIEBGS1XXX");
        assert_eq!(records[1].address, "TSAR ASEN 20");

        assert_eq!(records[2].address, "");
        assert!(records.iter().all(|r| r.id.is_none() && r.headquarter.is_none()));
    }

    #[test]
    fn test_short_rows_read_as_empty_cells() {
        let input = "COUNTRY ISO2 CODE,SWIFT CODE\nPL,AAAABBCCXXX\n";
        let records = read_csv(input.as_bytes()).unwrap();

        assert_eq!(records[0].code, "AAAABBCCXXX");
        assert_eq!(records[0].bank_name, "");
        assert_eq!(records[0].country_name, "");
    }

    #[test]
    fn test_csv_file_source() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let source = CsvRecordSource::new(file.path());
        assert_eq!(source.read_records().unwrap().len(), 3);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let source = CsvRecordSource::new("/definitely/not/here.csv");
        let err = source.read_records().unwrap_err();
        assert!(matches!(err, crate::error::DirectoryError::Io(_)));
    }
}
