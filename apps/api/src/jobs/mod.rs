// Job postings: recruiter-side creation and review, seeker-side listing.

pub mod handlers;
