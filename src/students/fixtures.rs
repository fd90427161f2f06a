//! Built-in student roster used by the `fixtures` data source and for seeding.

use chrono::NaiveDate;

use crate::storage::{AcademicInfo, ContactInfo, GuardianInfo, StudentRecord};

struct Row {
    id: &'static str,
    name: &'static str,
    roll_number: &'static str,
    email: &'static str,
    phone: &'static str,
    course: &'static str,
    semester: u8,
    cgpa: f64,
    attendance: u8,
    born: (i32, u32, u32),
    address: &'static str,
    guardian_name: &'static str,
    guardian_phone: &'static str,
}

const ROWS: &[Row] = &[
    Row {
        id: "CSE001",
        name: "Arun Kumar",
        roll_number: "CSE2024001",
        email: "arun.kumar@student.edu",
        phone: "+91-9876543210",
        course: "CSE",
        semester: 1,
        cgpa: 8.5,
        attendance: 92,
        born: (2005, 3, 15),
        address: "Delhi, India",
        guardian_name: "Rajesh Kumar",
        guardian_phone: "+91-9876543211",
    },
    Row {
        id: "CSE002",
        name: "Priya Sharma",
        roll_number: "CSE2024002",
        email: "priya.sharma@student.edu",
        phone: "+91-9876543212",
        course: "CSE",
        semester: 1,
        cgpa: 9.1,
        attendance: 95,
        born: (2005, 7, 22),
        address: "Mumbai, India",
        guardian_name: "Suresh Sharma",
        guardian_phone: "+91-9876543213",
    },
    Row {
        id: "CSE003",
        name: "Rahul Singh",
        roll_number: "CSE2024003",
        email: "rahul.singh@student.edu",
        phone: "+91-9876543214",
        course: "CSE",
        semester: 1,
        cgpa: 7.8,
        attendance: 88,
        born: (2005, 1, 10),
        address: "Bangalore, India",
        guardian_name: "Mohan Singh",
        guardian_phone: "+91-9876543215",
    },
    Row {
        id: "CSE004",
        name: "Sneha Patel",
        roll_number: "CSE2023001",
        email: "sneha.patel@student.edu",
        phone: "+91-9876543216",
        course: "CSE",
        semester: 2,
        cgpa: 8.9,
        attendance: 94,
        born: (2004, 11, 5),
        address: "Ahmedabad, India",
        guardian_name: "Kiran Patel",
        guardian_phone: "+91-9876543217",
    },
    Row {
        id: "CSE005",
        name: "Vikash Gupta",
        roll_number: "CSE2023002",
        email: "vikash.gupta@student.edu",
        phone: "+91-9876543218",
        course: "CSE",
        semester: 2,
        cgpa: 8.2,
        attendance: 90,
        born: (2004, 8, 18),
        address: "Kolkata, India",
        guardian_name: "Ramesh Gupta",
        guardian_phone: "+91-9876543219",
    },
    Row {
        id: "ECE001",
        name: "Anjali Reddy",
        roll_number: "ECE2024001",
        email: "anjali.reddy@student.edu",
        phone: "+91-9876543220",
        course: "ECE",
        semester: 1,
        cgpa: 8.7,
        attendance: 91,
        born: (2005, 5, 12),
        address: "Hyderabad, India",
        guardian_name: "Ravi Reddy",
        guardian_phone: "+91-9876543221",
    },
    Row {
        id: "ECE002",
        name: "Karan Mehta",
        roll_number: "ECE2024002",
        email: "karan.mehta@student.edu",
        phone: "+91-9876543222",
        course: "ECE",
        semester: 1,
        cgpa: 7.9,
        attendance: 87,
        born: (2005, 2, 28),
        address: "Pune, India",
        guardian_name: "Ashok Mehta",
        guardian_phone: "+91-9876543223",
    },
    Row {
        id: "ECE003",
        name: "Deepika Jain",
        roll_number: "ECE2023001",
        email: "deepika.jain@student.edu",
        phone: "+91-9876543224",
        course: "ECE",
        semester: 2,
        cgpa: 9.0,
        attendance: 96,
        born: (2004, 9, 14),
        address: "Jaipur, India",
        guardian_name: "Prakash Jain",
        guardian_phone: "+91-9876543225",
    },
    Row {
        id: "ME001",
        name: "Rohit Verma",
        roll_number: "ME2024001",
        email: "rohit.verma@student.edu",
        phone: "+91-9876543226",
        course: "ME",
        semester: 1,
        cgpa: 8.3,
        attendance: 89,
        born: (2005, 4, 20),
        address: "Lucknow, India",
        guardian_name: "Vinod Verma",
        guardian_phone: "+91-9876543227",
    },
    Row {
        id: "CE001",
        name: "Pooja Agarwal",
        roll_number: "CE2024001",
        email: "pooja.agarwal@student.edu",
        phone: "+91-9876543228",
        course: "CE",
        semester: 1,
        cgpa: 8.6,
        attendance: 93,
        born: (2005, 6, 8),
        address: "Indore, India",
        guardian_name: "Manoj Agarwal",
        guardian_phone: "+91-9876543229",
    },
    Row {
        id: "EE001",
        name: "Amit Yadav",
        roll_number: "EE2024001",
        email: "amit.yadav@student.edu",
        phone: "+91-9876543230",
        course: "EE",
        semester: 1,
        cgpa: 7.5,
        attendance: 85,
        born: (2005, 12, 3),
        address: "Patna, India",
        guardian_name: "Sunil Yadav",
        guardian_phone: "+91-9876543231",
    },
    Row {
        id: "IT001",
        name: "Neha Soni",
        roll_number: "IT2024001",
        email: "neha.soni@student.edu",
        phone: "+91-9876543232",
        course: "IT",
        semester: 1,
        cgpa: 8.8,
        attendance: 97,
        born: (2005, 10, 16),
        address: "Chandigarh, India",
        guardian_name: "Rajiv Soni",
        guardian_phone: "+91-9876543233",
    },
];

impl Row {
    fn to_record(&self) -> StudentRecord {
        let (year, month, day) = self.born;
        StudentRecord {
            id: self.id.to_string(),
            name: self.name.to_string(),
            roll_number: self.roll_number.to_string(),
            contact: ContactInfo {
                email: self.email.to_string(),
                phone: self.phone.to_string(),
                date_of_birth: NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default(),
                address: self.address.to_string(),
            },
            academic: AcademicInfo {
                course: self.course.to_string(),
                semester: self.semester,
                cgpa: self.cgpa,
                attendance: self.attendance,
            },
            guardian: GuardianInfo {
                name: self.guardian_name.to_string(),
                phone: self.guardian_phone.to_string(),
            },
        }
    }
}

/// The built-in roster.
#[must_use]
pub fn fixture_students() -> Vec<StudentRecord> {
    ROWS.iter().map(Row::to_record).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_fixture_count() {
        assert_eq!(fixture_students().len(), 12);
    }

    #[test]
    fn test_fixture_ids_unique() {
        let students = fixture_students();
        let ids: HashSet<_> = students.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids.len(), students.len());
    }

    #[test]
    fn test_fixture_dates_are_real() {
        let default = NaiveDate::default();
        assert!(fixture_students()
            .iter()
            .all(|s| s.contact.date_of_birth != default));
    }

    #[test]
    fn test_fixture_courses_are_catalogued() {
        let catalog = crate::catalog::Catalog::standard();
        for student in fixture_students() {
            assert!(catalog.course(&student.academic.course).is_some());
            assert!(catalog.has_semester(student.academic.semester));
        }
    }
}
