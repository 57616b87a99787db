use std::path::Path;

use chrono::Utc;
use log::{debug, info, warn};
use sqlx::SqlitePool;

use crate::errors::AppError;
use crate::models::employee::*;
use crate::utils::bitmap;

#[derive(Debug, Clone, Copy)]
pub struct SampleEmployee {
    pub employee_id: i32,
    pub last_name: &'static str,
    pub first_name: &'static str,
    pub address: &'static str,
    pub city: &'static str,
    pub region: Option<&'static str>,
    pub postal_code: &'static str,
    pub country: &'static str,
    pub home_phone: &'static str,
}

pub const SAMPLE_EMPLOYEES: [SampleEmployee; 9] = [
    SampleEmployee {
        employee_id: 1,
        last_name: "Davolio",
        first_name: "Nancy",
        address: "507 - 20th Ave. E. Apt. 2A",
        city: "Seattle",
        region: Some("WA"),
        postal_code: "98122",
        country: "USA",
        home_phone: "(206) 555-9857",
    },
    SampleEmployee {
        employee_id: 2,
        last_name: "Fuller",
        first_name: "Andrew",
        address: "908 W. Capital Way",
        city: "Tacoma",
        region: Some("WA"),
        postal_code: "98401",
        country: "USA",
        home_phone: "(206) 555-9482",
    },
    SampleEmployee {
        employee_id: 3,
        last_name: "Leverling",
        first_name: "Janet",
        address: "722 Moss Bay Blvd.",
        city: "Kirkland",
        region: Some("WA"),
        postal_code: "98033",
        country: "USA",
        home_phone: "(206) 555-3412",
    },
    SampleEmployee {
        employee_id: 4,
        last_name: "Peacock",
        first_name: "Margaret",
        address: "4110 Old Redmond Rd.",
        city: "Redmond",
        region: Some("WA"),
        postal_code: "98052",
        country: "USA",
        home_phone: "(206) 555-8122",
    },
    SampleEmployee {
        employee_id: 5,
        last_name: "Buchanan",
        first_name: "Steven",
        address: "14 Garrett Hill",
        city: "London",
        region: None,
        postal_code: "SW1 8JR",
        country: "UK",
        home_phone: "(71) 555-4848",
    },
    SampleEmployee {
        employee_id: 6,
        last_name: "Suyama",
        first_name: "Michael",
        address: "Coventry House Miner Rd.",
        city: "London",
        region: None,
        postal_code: "EC2 7JR",
        country: "UK",
        home_phone: "(71) 555-7773",
    },
    SampleEmployee {
        employee_id: 7,
        last_name: "King",
        first_name: "Robert",
        address: "Edgeham Hollow Winchester Way",
        city: "London",
        region: None,
        postal_code: "RG1 9SP",
        country: "UK",
        home_phone: "(71) 555-5598",
    },
    SampleEmployee {
        employee_id: 8,
        last_name: "Callahan",
        first_name: "Laura",
        address: "4726 - 11th Ave. N.E.",
        city: "Seattle",
        region: Some("WA"),
        postal_code: "98105",
        country: "USA",
        home_phone: "(206) 555-1189",
    },
    SampleEmployee {
        employee_id: 9,
        last_name: "Dodsworth",
        first_name: "Anne",
        address: "7 Houndstooth Rd.",
        city: "London",
        region: None,
        postal_code: "WG2 7LT",
        country: "UK",
        home_phone: "(71) 555-4444",
    },
];

const PORTRAIT_BACKGROUNDS: [(u8, u8, u8); 9] = [
    (70, 130, 180),
    (46, 139, 87),
    (178, 34, 34),
    (218, 165, 32),
    (106, 90, 205),
    (0, 128, 128),
    (205, 92, 92),
    (85, 107, 47),
    (199, 21, 133),
];

/// Generated stand-in portrait: a head and shoulders on a coloured background.
pub fn sample_portrait(employee_id: i32) -> Result<Vec<u8>, bitmap::BitmapError> {
    let background = PORTRAIT_BACKGROUNDS[employee_id.rem_euclid(PORTRAIT_BACKGROUNDS.len() as i32) as usize];
    let skin = (233, 196, 160);
    let shirt = (40, 40, 60);

    let w = bitmap::PHOTO_WIDTH as i64;
    let h = bitmap::PHOTO_HEIGHT as i64;
    let (head_x, head_y, head_r) = (w / 2, h * 3 / 8, w / 5);
    let shoulders_y = h * 5 / 8;

    bitmap::encode(bitmap::PHOTO_WIDTH, bitmap::PHOTO_HEIGHT, |x, y| {
        let (x, y) = (x as i64, y as i64);
        let dx = x - head_x;
        let dy = y - head_y;
        if dx * dx + dy * dy <= head_r * head_r {
            skin
        } else if y >= shoulders_y && (x - head_x).abs() <= (y - shoulders_y) + w / 4 {
            shirt
        } else {
            background
        }
    })
}

/// Photo for a sample row: `<photo_dir>/<id>.bmp` when it is a displayable
/// bitmap, otherwise a generated portrait.
pub async fn load_sample_photo(photo_dir: Option<&Path>, employee_id: i32) -> Result<Vec<u8>, AppError> {
    if let Some(dir) = photo_dir {
        let path = dir.join(format!("{}.bmp", employee_id));
        match tokio::fs::read(&path).await {
            Ok(bytes) => match bitmap::parse(&bytes) {
                Ok(_) => {
                    debug!("Using photo {} for employee {}", path.display(), employee_id);
                    return Ok(bytes);
                }
                Err(err) => warn!("Ignoring photo {}: {}", path.display(), err),
            },
            Err(err) => warn!("Cannot read photo {}: {}", path.display(), err),
        }
    }
    sample_portrait(employee_id).map_err(|err| AppError::InternalServerError(err.to_string()))
}

/// Inserts `employees` inside a single transaction. Nothing is committed
/// unless every row and its photo were written.
pub async fn insert_sample_employees(
    pool: &SqlitePool,
    employees: &[SampleEmployee],
    photo_dir: Option<&Path>,
) -> Result<(), AppError> {
    const STEP: &str = "Insert sample employees";

    let mut tx = pool.begin().await.map_err(AppError::database(STEP))?;
    let now = Utc::now();

    for employee in employees {
        let photo = load_sample_photo(photo_dir, employee.employee_id).await?;

        // Dropping `tx` on the error path rolls everything back.
        sqlx::query(
            "INSERT INTO Employees (EmployeeID, LastName, FirstName, Address, City, Region, PostalCode, Country, HomePhone, Photo, UpdatedAt) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(employee.employee_id)
        .bind(truncate_to(employee.last_name, LAST_NAME_LEN))
        .bind(truncate_to(employee.first_name, FIRST_NAME_LEN))
        .bind(truncate_to(employee.address, ADDRESS_LEN))
        .bind(truncate_to(employee.city, CITY_LEN))
        .bind(employee.region.map(|region| truncate_to(region, REGION_LEN)))
        .bind(truncate_to(employee.postal_code, POSTAL_CODE_LEN))
        .bind(truncate_to(employee.country, COUNTRY_LEN))
        .bind(truncate_to(employee.home_phone, HOME_PHONE_LEN))
        .bind(photo)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(AppError::database(STEP))?;
    }

    tx.commit().await.map_err(AppError::database(STEP))?;
    info!("Inserted {} sample employees", employees.len());
    Ok(())
}
