mod domain_test;
