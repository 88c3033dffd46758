use std::fmt;

#[derive(Debug, Clone)]
#[cfg_attr(test, derive(PartialEq, Eq))]
pub struct Appointment {
    pub specialty: String,
    pub doctor: String,
    pub date: String,
    pub time: String,
}

/// The parallel arrays of a booking form submission.
#[derive(Debug, Default)]
pub struct Booking {
    specialties: Vec<String>,
    doctors: Vec<String>,
    dates: Vec<String>,
    times: Vec<String>,
}

impl Booking {
    /// Accepts both `especialidad[]` and bare `especialidad` style keys;
    /// unknown keys are ignored.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut booking = Self::default();

        for (key, value) in pairs {
            let column = match key.strip_suffix("[]").unwrap_or(&key) {
                "especialidad" => &mut booking.specialties,
                "medico" => &mut booking.doctors,
                "fecha" => &mut booking.dates,
                "hora" => &mut booking.times,
                _ => continue,
            };
            column.push(value);
        }

        booking
    }

    /// Zips the columns positionally, the shortest column bounds the count.
    pub fn into_appointments(self) -> Vec<Appointment> {
        let Self {
            specialties,
            doctors,
            dates,
            times,
        } = self;

        specialties
            .into_iter()
            .zip(doctors)
            .zip(dates)
            .zip(times)
            .map(|(((specialty, doctor), date), time)| Appointment {
                specialty,
                doctor,
                date,
                time,
            })
            .collect()
    }
}

impl fmt::Display for Appointment {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            fmt,
            "{} con {} el {} a las {}",
            self.specialty, self.doctor, self.date, self.time
        )
    }
}
