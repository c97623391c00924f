use crate::domain::listing::StoredProperty;
use crate::errors::ServerError;
use crate::responses::xlsx_response;
use crate::responses::ResultResp;
use rust_xlsxwriter::{Format, Workbook};

const HEADERS: [&str; 12] = [
    "Address",
    "City",
    "State",
    "Zip",
    "Price",
    "Beds",
    "Baths",
    "Sq Ft",
    "Type",
    "Source",
    "URL",
    "Scraped At",
];

/// Builds the workbook bytes for a set of stored properties.
pub fn properties_workbook(properties: &[StoredProperty]) -> Result<Vec<u8>, ServerError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    let bold = Format::new().set_bold();

    for (col, header) in HEADERS.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, *header, &bold)
            .map_err(|e| {
                ServerError::XlsxError(format!("Failed to write header '{}': {}", header, e))
            })?;
    }

    for (i, p) in properties.iter().enumerate() {
        let r = (i + 1) as u32;

        worksheet.write_string(r, 0, &p.address)?;
        worksheet.write_string(r, 1, &p.city)?;
        worksheet.write_string(r, 2, &p.state)?;
        worksheet.write_string(r, 3, p.zip_code.as_deref().unwrap_or(""))?;
        worksheet.write_number(r, 4, p.price as f64)?;
        if let Some(beds) = p.bedrooms {
            worksheet.write_number(r, 5, beds as f64)?;
        }
        if let Some(baths) = p.bathrooms {
            worksheet.write_number(r, 6, baths)?;
        }
        if let Some(sqft) = p.square_feet {
            worksheet.write_number(r, 7, sqft as f64)?;
        }
        worksheet.write_string(r, 8, p.property_type.as_str())?;
        worksheet.write_string(r, 9, &p.source)?;
        worksheet.write_string(r, 10, &p.url)?;
        worksheet.write_string(r, 11, p.scraped_at.format("%Y-%m-%d %H:%M").to_string())?;
    }

    workbook
        .save_to_buffer()
        .map_err(|e| ServerError::XlsxError(format!("Failed to save workbook: {}", e)))
}

pub fn export_properties_xlsx(properties: &[StoredProperty], city: Option<&str>) -> ResultResp {
    let buffer = properties_workbook(properties)?;
    let scope = city
        .map(|c| c.to_lowercase().replace(' ', "_"))
        .unwrap_or_else(|| "all".to_string());
    xlsx_response(buffer, &format!("properties_{scope}.xlsx"))
}
