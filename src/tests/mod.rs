#[cfg(test)]
mod common;


#[cfg(test)]
mod replacement_test;



#[cfg(test)]
mod proof_file_test;
