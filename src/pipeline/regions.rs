//! Region lookup dimension: Brazil's 27 federative units.

use crate::constants::{DIMENSIONS_SCHEMA, REGION_LOOKUP_TABLE};
use crate::db::Database;
use crate::error::Result;
use crate::manifest::TableRef;
use duckdb::params;
use std::fmt;
use tracing::info;

pub const COUNTRY: &str = "Brazil";

/// Macro-regions used by IBGE to group the states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegionGroup {
    North,
    Northeast,
    CentralWest,
    Southeast,
    South,
}

impl RegionGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegionGroup::North => "North",
            RegionGroup::Northeast => "Northeast",
            RegionGroup::CentralWest => "Central-West",
            RegionGroup::Southeast => "Southeast",
            RegionGroup::South => "South",
        }
    }
}

impl fmt::Display for RegionGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub code: &'static str,
    pub name: &'static str,
    pub group: RegionGroup,
}

const fn region(code: &'static str, name: &'static str, group: RegionGroup) -> Region {
    Region { code, name, group }
}

use RegionGroup::*;

pub const REGIONS: [Region; 27] = [
    region("AC", "Acre", North),
    region("AL", "Alagoas", Northeast),
    region("AP", "Amapá", North),
    region("AM", "Amazonas", North),
    region("BA", "Bahia", Northeast),
    region("CE", "Ceará", Northeast),
    region("DF", "Distrito Federal", CentralWest),
    region("ES", "Espírito Santo", Southeast),
    region("GO", "Goiás", CentralWest),
    region("MA", "Maranhão", Northeast),
    region("MT", "Mato Grosso", CentralWest),
    region("MS", "Mato Grosso do Sul", CentralWest),
    region("MG", "Minas Gerais", Southeast),
    region("PA", "Pará", North),
    region("PB", "Paraíba", Northeast),
    region("PR", "Paraná", South),
    region("PE", "Pernambuco", Northeast),
    region("PI", "Piauí", Northeast),
    region("RJ", "Rio de Janeiro", Southeast),
    region("RN", "Rio Grande do Norte", Northeast),
    region("RS", "Rio Grande do Sul", South),
    region("RO", "Rondônia", North),
    region("RR", "Roraima", North),
    region("SC", "Santa Catarina", South),
    region("SP", "São Paulo", Southeast),
    region("SE", "Sergipe", Northeast),
    region("TO", "Tocantins", North),
];

pub(crate) fn region_table() -> TableRef {
    TableRef {
        schema: DIMENSIONS_SCHEMA.to_string(),
        table: REGION_LOOKUP_TABLE.to_string(),
    }
}

/// Replace `dimensions.region_lookup` with the static region list
pub fn build_region_lookup(db: &mut Database) -> Result<usize> {
    let table = region_table().qualified();

    let tx = db.connection_mut().transaction()?;
    tx.execute_batch(&format!(
        "DROP TABLE IF EXISTS {table};
         CREATE TABLE {table} (
             state_code VARCHAR PRIMARY KEY,
             state_name VARCHAR NOT NULL,
             region VARCHAR NOT NULL,
             country VARCHAR NOT NULL
         );"
    ))?;
    {
        let mut appender = tx.appender_to_db(REGION_LOOKUP_TABLE, DIMENSIONS_SCHEMA)?;
        for region in &REGIONS {
            appender.append_row(params![region.code, region.name, region.group.as_str(), COUNTRY])?;
        }
        appender.flush()?;
    }
    tx.commit()?;

    info!("Created region lookup dimension: {} rows", REGIONS.len());
    Ok(REGIONS.len())
}
