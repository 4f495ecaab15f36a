//! CSV export of the annual collection ledger.

use rust_decimal::Decimal;

use crate::error::{LedgerError, LedgerResult};
use crate::model::{Amounts, LiquidationDocument, TributeRecord};

pub const COL_ENTITY: &str = "ENT";
pub const COL_YEAR: &str = "C_EJERCICIO";
pub const COL_CONCEPT: &str = "C_CONCEPTO";
pub const COL_ACCOUNTING_KEY: &str = "CLAVE_C";
pub const COL_COLLECTION_KEY: &str = "CLAVE_R";
pub const COL_CHARGE: &str = "C_CARGO";
pub const COL_WRITE_OFF: &str = "C_DATAS";
pub const COL_VOLUNTARY: &str = "C_VOLUNTARIA";
pub const COL_ENFORCED: &str = "C_EJECUTIVA";
pub const COL_PENDING: &str = "C_PENDIENTE";

/// Parse a ledger export into a document with derived summaries.
///
/// Rows with every core amount blank (charge, voluntary, enforced, pending)
/// are padding and skipped. Other blank amounts read as zero.
pub fn load_ledger_csv(csv_data: &str) -> LedgerResult<LiquidationDocument> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(csv_data.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();

    let idx = |name: &str| -> Result<usize, LedgerError> {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| LedgerError::MissingColumn(name.into()))
    };

    let entity_idx = idx(COL_ENTITY)?;
    let year_idx = idx(COL_YEAR)?;
    let concept_idx = idx(COL_CONCEPT)?;
    let accounting_idx = idx(COL_ACCOUNTING_KEY)?;
    let collection_idx = idx(COL_COLLECTION_KEY)?;
    let charge_idx = idx(COL_CHARGE)?;
    let write_off_idx = idx(COL_WRITE_OFF)?;
    let voluntary_idx = idx(COL_VOLUNTARY)?;
    let enforced_idx = idx(COL_ENFORCED)?;
    let pending_idx = idx(COL_PENDING)?;

    let mut entity: Option<String> = None;
    let mut records = Vec::new();
    let mut skipped = 0usize;

    for row in reader.records() {
        let row = row?;
        let line = row.position().map(|p| p.line()).unwrap_or(0);
        let cell = |i: usize| row.get(i).unwrap_or("").trim();

        if [charge_idx, voluntary_idx, enforced_idx, pending_idx]
            .iter()
            .all(|&i| cell(i).is_empty())
        {
            skipped += 1;
            continue;
        }

        let amount = |i: usize, column: &str| -> Result<Decimal, LedgerError> {
            let raw = cell(i);
            if raw.is_empty() {
                return Ok(Decimal::ZERO);
            }
            raw.parse().map_err(|_| LedgerError::AmountParse {
                line,
                column: column.into(),
                value: raw.into(),
            })
        };

        let year_raw = cell(year_idx);
        let fiscal_year: i32 = year_raw.parse().map_err(|_| LedgerError::YearParse {
            line,
            value: year_raw.into(),
        })?;

        if entity.is_none() {
            entity = Some(cell(entity_idx).to_string());
        }

        records.push(TributeRecord {
            fiscal_year,
            concept: cell(concept_idx).to_string(),
            accounting_key: cell(accounting_idx).to_string(),
            collection_key: cell(collection_idx).to_string(),
            amounts: Amounts {
                charge: amount(charge_idx, COL_CHARGE)?,
                write_off: amount(write_off_idx, COL_WRITE_OFF)?,
                voluntary: amount(voluntary_idx, COL_VOLUNTARY)?,
                enforced: amount(enforced_idx, COL_ENFORCED)?,
                pending: amount(pending_idx, COL_PENDING)?,
            },
        });
    }

    let entity = match entity.as_deref() {
        Some(code) if !code.is_empty() => format!("Entidad {code}"),
        _ => "Entidad N/A".to_string(),
    };

    tracing::debug!(records = records.len(), skipped, %entity, "ledger loaded");
    Ok(LiquidationDocument::from_records(entity, records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const HEADER: &str =
        "ENT,C_EJERCICIO,C_CONCEPTO,CLAVE_C,CLAVE_R,C_CARGO,C_DATAS,C_VOLUNTARIA,C_EJECUTIVA,C_PENDIENTE\n";

    fn ledger(rows: &str) -> String {
        format!("{HEADER}{rows}")
    }

    #[test]
    fn loads_rows() {
        let doc = load_ledger_csv(&ledger(
            "026,2023,IBI URBANA,2023.102,2023.102,200.00,0,100.00,50.00,50.00\n\
             026,2022, IVTM ,2023.205,2022.205,30.00,2.50,,25.00,2.50\n",
        ))
        .unwrap();

        assert_eq!(doc.entity, "Entidad 026");
        assert_eq!(doc.fiscal_year, 2023);
        assert_eq!(doc.total_records(), 2);

        let ivtm = &doc.records[1];
        assert_eq!(ivtm.concept, "IVTM");
        assert_eq!(ivtm.accounting_key, "2023.205");
        assert_eq!(ivtm.collection_key, "2022.205");
        assert_eq!(ivtm.amounts.voluntary, Decimal::ZERO);
        assert_eq!(ivtm.amounts.write_off, dec!(2.50));
        assert_eq!(doc.documented_totals.total(), dec!(175.00));
        assert_eq!(doc.years(), vec![2022, 2023]);
    }

    #[test]
    fn column_order_is_free_and_extras_ignored() {
        let csv = "C_PENDIENTE,EXTRA,C_EJECUTIVA,C_VOLUNTARIA,C_DATAS,C_CARGO,CLAVE_R,CLAVE_C,C_CONCEPTO,C_EJERCICIO,ENT\n\
                   1,x,2,3,0,6,2021.204,2021.204,IAE,2021,7\n";
        let doc = load_ledger_csv(csv).unwrap();
        assert_eq!(doc.records[0].amounts.total(), dec!(5));
        assert_eq!(doc.entity, "Entidad 7");
    }

    #[test]
    fn blank_padding_rows_skipped() {
        let doc = load_ledger_csv(&ledger(
            ",,,,,,,,,\n\
             026,2023,IBI,2023.102,2023.102,,9.00,,,\n\
             026,2023,IBI,2023.102,2023.102,0,,0,0,0\n",
        ))
        .unwrap();
        assert_eq!(doc.total_records(), 1);
        assert!(doc.records[0].amounts.is_zero());
    }

    #[test]
    fn empty_ledger_has_no_entity() {
        let doc = load_ledger_csv(HEADER).unwrap();
        assert_eq!(doc.entity, "Entidad N/A");
        assert!(doc.records.is_empty());
    }

    #[test]
    fn missing_column() {
        let err = load_ledger_csv("ENT,C_EJERCICIO\n026,2023\n").unwrap_err();
        assert!(matches!(err, LedgerError::MissingColumn(ref c) if c == COL_CONCEPT));
    }

    #[test]
    fn bad_amount_reports_line_and_column() {
        let err = load_ledger_csv(&ledger(
            "026,2023,IBI,2023.102,2023.102,1,0,1,0,0\n\
             026,2023,IBI,2023.102,2023.102,1,0,abc,0,0\n",
        ))
        .unwrap_err();
        match err {
            LedgerError::AmountParse { line, column, value } => {
                assert_eq!(line, 3);
                assert_eq!(column, COL_VOLUNTARY);
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn bad_year() {
        let err = load_ledger_csv(&ledger("026,2O23,IBI,2023.102,2023.102,1,0,1,0,0\n")).unwrap_err();
        assert!(matches!(err, LedgerError::YearParse { line: 2, ref value } if value == "2O23"));
    }
}
