//! BFSI call-center dataset generation
//!
//! Hand-written core intents plus templated variations. Application ids are
//! derived from SHA-256 so regenerating always yields the same dataset.

use sha2::{Digest, Sha256};

use crate::store::RecordStore;
use crate::types::Record;

/// Number of records the generated dataset is filled up to
pub const TARGET_RECORDS: usize = 160;

const LOAN_TYPES: [&str; 5] = ["personal", "home", "car", "education", "gold"];
const AMOUNTS: [&str; 6] = ["50,000", "1 lakh", "5 lakhs", "10 lakhs", "20 lakhs", "50 lakhs"];
const TENURES: [&str; 5] = ["1 year", "3 years", "5 years", "10 years", "20 years"];
const TRANSACTION_ISSUES: [&str; 4] = ["failed", "pending", "double debited", "unrecognized"];
const PHRASINGS: [&str; 4] = ["", "Please tell me, ", "I want to know, ", "Can you say, "];

const CORE_INTENTS: [(&str, &str, &str); 10] = [
    (
        "Check loan eligibility",
        "I have a salary of 50000 and want a personal loan.",
        "Based on your salary of 50,000, you are eligible for a personal loan of up to 10 lakhs. Interest rates start at 10.5% p.a.",
    ),
    (
        "Check loan application status",
        "What is the status of my loan application ID 12345?",
        "Your loan application (ID: 12345) is currently under review. You can expect an update within 24 hours.",
    ),
    (
        "EMI Calculation",
        "Calculate EMI for 5 lakhs loan for 3 years at 12% interest.",
        "For a loan of 5 lakhs at 12% interest for 3 years, your monthly EMI would be approximately Rs. 16,607.",
    ),
    (
        "Credit Card Limit Increase",
        "How can I increase my credit card limit?",
        "You can request a credit limit increase through our mobile app under 'Card Settings' or by sending an SMS 'LIMIT <Last 4 digits>' to 56767.",
    ),
    (
        "Report Fraud",
        "I suspect a fraudulent transaction on my account.",
        "Please block your card immediately using the mobile app or call our fraud helpline at 1800-123-4567. We will investigate the transaction.",
    ),
    (
        "Open Savings Account",
        "What documents do I need to open a savings account?",
        "To open a savings account, you need a valid ID proof (Aadhaar/PAN), address proof, and a passport-sized photograph. You can apply online or visit our nearest branch.",
    ),
    (
        "Fixed Deposit Rates",
        "What is the interest rate for a 1-year FD?",
        "Our current interest rate for a 1-year Fixed Deposit is 6.5% p.a. for general citizens and 7.0% p.a. for senior citizens.",
    ),
    (
        "Block Debit Card",
        "I lost my debit card, how do I block it?",
        "You can block your debit card instantly via our mobile app, net banking, or by creating an SMS 'BLOCK <Last 4 digits>' to 56767.",
    ),
    (
        "Reset Net Banking Password",
        "I forgot my net banking password.",
        "You can reset your net banking password by clicking on 'Forgot Password' on the login page and verifying your details using an OTP sent to your registered mobile number.",
    ),
    (
        "Update Address",
        "How can I change my registered address?",
        "To update your address, please visit your nearest branch with valid address proof or update it via Net Banking under the 'My Profile' section.",
    ),
];

const GENERAL_QUESTIONS: [(&str, &str); 10] = [
    ("What are the branch timings?", "Our branches are open from 10:00 AM to 4:00 PM, Monday to Saturday (except 2nd and 4th Saturdays)."),
    ("Do you offer car insurance?", "Yes, we offer comprehensive car insurance with accidental cover."),
    ("How to apply for a checkbook?", "You can request a new checkbook via Net Banking, ATM, or by visiting a branch."),
    ("What is the minimum balance for savings account?", "The minimum average monthly balance required is Rs. 10,000 for metro branches."),
    ("Is my money safe?", "Yes, your deposits are insured up to Rs. 5 lakhs by DICGC."),
    ("How do I enable international usage?", "You can enable international usage on your card through the 'Card Controls' section in our mobile app."),
    ("What is the customer care number?", "Our 24/7 customer care number is 1800-123-4567."),
    ("Can I withdraw cash without a card?", "Yes, you can use our Cardless Cash Withdrawal feature at enabled ATMs."),
    ("How to link Aadhaar?", "Link your Aadhaar via Net Banking, SMS, or by visiting a branch."),
    ("What is UPI limit?", "The daily UPI transaction limit is Rs. 1 lakh."),
];

/// Generate the full BFSI dataset
pub fn generate_bfsi_dataset() -> RecordStore {
    let mut data: Vec<Record> = CORE_INTENTS
        .iter()
        .map(|(instruction, input, output)| Record::new(*instruction, *input, *output))
        .collect();

    for loan_type in LOAN_TYPES {
        for amount in AMOUNTS {
            data.push(Record::new(
                format!("Check {} loan eligibility", loan_type),
                format!("Can I get a {} loan for {}?", loan_type, amount),
                format!(
                    "Yes, you can apply for a {} loan of {}. Eligibility depends on your income and credit score. Please provide your monthly income for a detailed check.",
                    loan_type, amount
                ),
            ));
        }
    }

    for amount in AMOUNTS {
        for tenure in TENURES {
            data.push(Record::new(
                "Calculate EMI",
                format!("What is the EMI for {} for {}?", amount, tenure),
                format!(
                    "For a loan of {} for {}, the EMI depends on the interest rate. At a standard 10% rate, please use our EMI calculator for precise figures.",
                    amount, tenure
                ),
            ));
        }
    }

    for issue in TRANSACTION_ISSUES {
        data.push(Record::new(
            "Transaction Issue",
            format!("My transaction {}.", issue),
            format!(
                "If your transaction is {}, please wait for 24 hours for auto-reversal. If not resolved, raise a dispute in the app.",
                issue
            ),
        ));
    }

    for (question, answer) in GENERAL_QUESTIONS {
        for phrasing in PHRASINGS {
            data.push(Record::new(
                "General Inquiry",
                format!("{}{}", phrasing, question),
                answer,
            ));
        }
    }

    let mut seed = 0u64;
    while data.len() < TARGET_RECORDS {
        let id = application_id(seed);
        data.push(Record::new(
            "Check Application Status",
            format!("Status of application {}?", id),
            format!("Application {} is currently processing.", id),
        ));
        seed += 1;
    }

    RecordStore::new(data)
}

/// Five-digit application id derived from `seed`
fn application_id(seed: u64) -> u32 {
    let digest = Sha256::digest(format!("application-status-{}", seed).as_bytes());
    let value = u32::from_le_bytes([digest[0], digest[1], digest[2], digest[3]]);
    10_000 + value % 90_000
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_dataset_size_and_layout() {
        let store = generate_bfsi_dataset();
        assert_eq!(store.len(), TARGET_RECORDS);

        assert_eq!(store.get(0).unwrap().instruction, "Check loan eligibility");
        assert_eq!(store.get(7).unwrap().input, "I lost my debit card, how do I block it?");
        assert_eq!(
            store.get(7).unwrap().output,
            "You can block your debit card instantly via our mobile app, net banking, or by creating an SMS 'BLOCK <Last 4 digits>' to 56767."
        );
        assert_eq!(store.get(10).unwrap().input, "Can I get a personal loan for 50,000?");
        assert_eq!(store.get(40).unwrap().input, "What is the EMI for 50,000 for 1 year?");
        assert_eq!(store.get(70).unwrap().input, "My transaction failed.");
        assert_eq!(store.get(75).unwrap().input, "Please tell me, What are the branch timings?");
        assert_eq!(store.get(114).unwrap().instruction, "Check Application Status");
    }

    #[test]
    fn test_dataset_is_deterministic() {
        assert_eq!(generate_bfsi_dataset(), generate_bfsi_dataset());
    }

    #[test]
    fn test_inputs_are_unique() {
        let store = generate_bfsi_dataset();
        let unique: HashSet<&str> = store.iter().map(|r| r.input.as_str()).collect();
        assert_eq!(unique.len(), store.len());
    }

    #[test]
    fn test_application_ids_are_five_digits() {
        for seed in 0..100 {
            let id = application_id(seed);
            assert!((10_000..100_000).contains(&id));
        }
    }
}
