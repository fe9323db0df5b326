use crate::bus::Bus;
use crate::schedule::{PointType, Schedule, SchedulePoint};
use crate::seat::{Deck, Seat, SeatPosition, SeatType};
use chrono::NaiveTime;
use uuid::Uuid;

/// Demo fleet used to bootstrap an empty catalog: two coaches on overnight
/// routes with a mixed seater/sleeper layout.
pub struct SeedData {
    pub buses: Vec<Bus>,
    pub seats: Vec<Seat>,
    pub schedules: Vec<Schedule>,
}

pub fn demo_fleet() -> SeedData {
    let mut buses = Vec::new();
    let mut seats = Vec::new();
    let mut schedules = Vec::new();

    let skyline = Bus::new("Skyline Travels", "MH-12-AB-4321", "2+2 seater / 1+1 sleeper");
    seats.extend(build_seats(&skyline));
    schedules.push(build_schedule(
        &skyline,
        "Pune",
        "Goa",
        NaiveTime::from_hms_opt(21, 30, 0).unwrap(),
        NaiveTime::from_hms_opt(7, 15, 0).unwrap(),
        vec![0, 1, 2, 3, 4, 5, 6],
        50000,
    ));
    buses.push(skyline);

    let highline = Bus::new("Highline Express", "KA-01-CD-8765", "2+2 seater / 1+1 sleeper");
    seats.extend(build_seats(&highline));
    schedules.push(build_schedule(
        &highline,
        "Bengaluru",
        "Hyderabad",
        NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
        NaiveTime::from_hms_opt(5, 45, 0).unwrap(),
        vec![0, 2, 4, 5],
        65000,
    ));
    buses.push(highline);

    SeedData {
        buses,
        seats,
        schedules,
    }
}

/// Lower deck: 4 rows of 2+2 seaters, window seats carry a premium. Upper
/// deck: 4 rows of 1+1 sleepers; the first sleeper row is female-only.
fn build_seats(bus: &Bus) -> Vec<Seat> {
    let mut seats = Vec::new();

    for row in 1..=4i16 {
        for column in 0..4i16 {
            let position = match column {
                0 | 3 => SeatPosition::Window,
                _ => SeatPosition::Aisle,
            };
            let modifier = if position == SeatPosition::Window {
                5000
            } else {
                0
            };
            seats.push(Seat {
                id: Uuid::new_v4(),
                bus_id: bus.id,
                seat_number: format!("L{}{}", row, (b'A' + column as u8) as char),
                seat_type: SeatType::Seater,
                deck: Deck::Lower,
                row,
                column,
                position,
                price_modifier_minor: modifier,
                female_only: false,
            });
        }
    }

    for row in 1..=4i16 {
        for column in 0..2i16 {
            seats.push(Seat {
                id: Uuid::new_v4(),
                bus_id: bus.id,
                seat_number: format!("U{}{}", row, (b'A' + column as u8) as char),
                seat_type: SeatType::Sleeper,
                deck: Deck::Upper,
                row,
                column,
                position: SeatPosition::Window,
                price_modifier_minor: 15000,
                female_only: row == 1,
            });
        }
    }

    seats
}

fn build_schedule(
    bus: &Bus,
    origin: &str,
    destination: &str,
    departure_time: NaiveTime,
    arrival_time: NaiveTime,
    days_of_week: Vec<i16>,
    base_price_minor: i64,
) -> Schedule {
    let schedule_id = Uuid::new_v4();
    let points = vec![
        SchedulePoint {
            id: Uuid::new_v4(),
            schedule_id,
            name: format!("{} Central Depot", origin),
            point_type: PointType::Boarding,
            point_time: departure_time,
        },
        SchedulePoint {
            id: Uuid::new_v4(),
            schedule_id,
            name: format!("{} Bypass", origin),
            point_type: PointType::Boarding,
            point_time: departure_time + chrono::Duration::minutes(30),
        },
        SchedulePoint {
            id: Uuid::new_v4(),
            schedule_id,
            name: format!("{} Outskirts", destination),
            point_type: PointType::Dropping,
            point_time: arrival_time - chrono::Duration::minutes(25),
        },
        SchedulePoint {
            id: Uuid::new_v4(),
            schedule_id,
            name: format!("{} Bus Stand", destination),
            point_type: PointType::Dropping,
            point_time: arrival_time,
        },
    ];

    Schedule {
        id: schedule_id,
        bus_id: bus.id,
        origin: origin.to_string(),
        destination: destination.to_string(),
        departure_time,
        arrival_time,
        days_of_week,
        base_price_minor,
        points,
    }
}
